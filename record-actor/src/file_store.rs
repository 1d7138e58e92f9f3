//! JSON document store on local disk.
//!
//! Every operation re-reads the document before acting, so edits made to the
//! file outside the service are picked up on the next command. Mutations write
//! the whole document back through a sibling temp file and a rename, which
//! keeps readers from ever observing a half-written file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::record::{Record, RecordId};
use crate::store::{MemoryStore, Store, StoreResult};

/// [`Store`] backed by a JSON array of records.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Opens the document at `path`, creating it (and its parent directory)
    /// as an empty collection when it does not exist yet.
    ///
    /// # Errors
    /// - `StoreError::Io` if the directory or file cannot be created
    /// - `StoreError::Io` with kind `InvalidData` if an existing file is not a
    ///   valid record document
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let store = Self { path };
        if store.path.exists() {
            store.load()?;
        } else {
            store.save(&MemoryStore::new())?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<MemoryStore> {
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(MemoryStore::new());
        }
        let records: Vec<Record> = serde_json::from_str(&contents).map_err(to_io_error)?;
        debug!(path = %self.path.display(), records = records.len(), "reloaded record file");
        MemoryStore::from_records(records)
    }

    fn save(&self, table: &MemoryStore) -> StoreResult<()> {
        let records: Vec<&Record> = table.records().collect();
        let mut encoded = serde_json::to_vec_pretty(&records).map_err(to_io_error)?;
        encoded.push(b'\n');

        let tmp = self.temp_path();
        fs::write(&tmp, &encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Loads the current document, applies `op` and persists the result only
    /// when `op` succeeded.
    fn mutate<T>(&self, op: impl FnOnce(&mut MemoryStore) -> StoreResult<T>) -> StoreResult<T> {
        let mut table = self.load()?;
        let output = op(&mut table)?;
        self.save(&table)?;
        Ok(output)
    }
}

impl Store for JsonFileStore {
    fn create(&mut self, description: String, status: String) -> StoreResult<Record> {
        self.mutate(|table| table.create(description, status))
    }

    fn update(
        &mut self,
        id: RecordId,
        description: String,
        status: String,
    ) -> StoreResult<Record> {
        self.mutate(|table| table.update(id, description, status))
    }

    fn delete(&mut self, id: RecordId) -> StoreResult<()> {
        self.mutate(|table| table.delete(id))
    }

    fn get(&mut self, id: RecordId) -> StoreResult<Record> {
        self.load()?.get(id)
    }

    fn list_all(&mut self) -> StoreResult<Vec<Record>> {
        self.load()?.list_all()
    }
}

fn to_io_error(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn open_creates_missing_file_and_parent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("records.json");

        let mut store = JsonFileStore::open(&path).expect("open store");

        assert!(path.exists());
        assert!(store.list_all().expect("list").is_empty());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("records.json");

        let created = {
            let mut store = JsonFileStore::open(&path).expect("open store");
            store.create("buy milk".into(), "open".into()).expect("create")
        };

        let mut reopened = JsonFileStore::open(&path).expect("reopen store");
        assert_eq!(reopened.get(created.id).expect("get"), created);
    }

    #[test]
    fn picks_up_external_edits_before_each_command() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("records.json");
        let mut store = JsonFileStore::open(&path).expect("open store");
        store.create("first".into(), "open".into()).expect("create");

        let mut other = JsonFileStore::open(&path).expect("second view");
        other.create("second".into(), "open".into()).expect("create");

        let descriptions: Vec<_> = store
            .list_all()
            .expect("list")
            .into_iter()
            .map(|r| r.description)
            .collect();
        assert_eq!(descriptions, vec!["first", "second"]);
    }

    #[test]
    fn failed_mutation_leaves_document_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("records.json");
        let mut store = JsonFileStore::open(&path).expect("open store");
        store.create("keep".into(), "open".into()).expect("create");
        let before = fs::read_to_string(&path).expect("read");

        let result = store.delete(42);

        assert!(matches!(result, Err(StoreError::NotFound(42))));
        assert_eq!(fs::read_to_string(&path).expect("read"), before);
    }

    #[test]
    fn empty_file_reads_as_empty_collection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("records.json");
        fs::write(&path, "").expect("write");

        let mut store = JsonFileStore::open(&path).expect("open store");
        assert!(store.list_all().expect("list").is_empty());
    }

    #[test]
    fn malformed_document_is_an_io_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("records.json");
        fs::write(&path, "{not json").expect("write");

        match JsonFileStore::open(&path) {
            Err(StoreError::Io(err)) => assert_eq!(err.kind(), io::ErrorKind::InvalidData),
            other => panic!("expected invalid data, got {other:?}"),
        }
    }
}
