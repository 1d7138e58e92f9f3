//! Tracing setup and small helpers shared by the binary and the HTTP layer.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_FILE_NAME: &str = "record-actor.log";

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. With a `log_dir` the
/// output is appended to [`LOG_FILE_NAME`] inside it (created if needed),
/// otherwise it goes to stderr. Returns the log file path when one is used.
///
/// Calling this twice is harmless; the second subscriber is ignored.
pub fn init_tracing(default_level: &str, log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .with_context(|| format!("invalid log level `{default_level}`"))?;

    let Some(dir) = log_dir else {
        let _ = fmt().with_env_filter(filter).with_target(false).try_init();
        return Ok(None);
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let path = dir.join(LOG_FILE_NAME);
    let file = open_log_file(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(Some(path))
}

/// Opens `path` for appending, creating it if it does not exist.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Resolves `<user cache dir>/<app_name>` and makes sure it exists.
pub fn app_data_dir(app_name: &str) -> io::Result<PathBuf> {
    let base = dirs::cache_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "no cache directory for this user")
    })?;
    let dir = base.join(app_name);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Random 128-bit identifier rendered as 32 lowercase hex characters.
pub fn generate_id() -> String {
    let bytes: [u8; 16] = rand::random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn generated_ids_are_32_hex_chars() {
        let id = generate_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(generate_id(), generate_id());
    }

    #[test]
    fn log_file_is_appended_not_truncated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(LOG_FILE_NAME);

        writeln!(open_log_file(&path).expect("open"), "first").expect("write");
        writeln!(open_log_file(&path).expect("reopen"), "second").expect("write");

        let contents = fs::read_to_string(&path).expect("read");
        assert_eq!(contents, "first\nsecond\n");
    }
}
