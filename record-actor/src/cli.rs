use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Serve a record collection over HTTP through a single-writer command actor.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Socket address the HTTP server should bind to. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// JSON file holding the records. Defaults to `records.json` in the user cache directory.
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Directory for the log file. Logs go to stderr when omitted.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Default log filter, overridden by RUST_LOG.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Give up waiting for the actor after this many milliseconds.
    #[arg(long)]
    pub call_timeout_ms: Option<u64>,
}

impl Cli {
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_arguments() {
        let cli = Cli::try_parse_from(["record-actor"]).expect("parse");
        assert_eq!(cli.listen, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cli.log_level, "info");
        assert!(cli.data_file.is_none());
        assert!(cli.call_timeout().is_none());
    }

    #[test]
    fn timeout_is_read_in_milliseconds() {
        let cli = Cli::try_parse_from(["record-actor", "--call-timeout-ms", "250"]).expect("parse");
        assert_eq!(cli.call_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn rejects_malformed_listen_address() {
        assert!(Cli::try_parse_from(["record-actor", "--listen", "nowhere"]).is_err());
    }
}
