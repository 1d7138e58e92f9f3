//! Record storage driven by the command actor.
//!
//! [`Store`] is the only surface the actor loop touches. Implementations take
//! `&mut self` and hold no locks: once a store is handed to
//! [`spawn_actor`](crate::actor::spawn_actor) it is moved onto the actor thread
//! and nothing else can reach it.

use std::collections::BTreeMap;
use std::io;

use chrono::Utc;
use thiserror::Error;

use crate::record::{Record, RecordId};

/// Failures a store can report. The actor relays these to callers unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(RecordId),
    #[error("storage I/O failure: {0}")]
    Io(#[from] io::Error),
    #[error("invalid record: {0}")]
    Invalid(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Operations the command actor dispatches to.
///
/// Every call must return before the next command is dispatched. Reads take
/// `&mut self` as well so implementations are free to refresh cached state.
pub trait Store {
    fn create(&mut self, description: String, status: String) -> StoreResult<Record>;

    fn update(
        &mut self,
        id: RecordId,
        description: String,
        status: String,
    ) -> StoreResult<Record>;

    fn delete(&mut self, id: RecordId) -> StoreResult<()>;

    fn get(&mut self, id: RecordId) -> StoreResult<Record>;

    /// Returns every record ordered by id.
    fn list_all(&mut self) -> StoreResult<Vec<Record>>;
}

/// In-memory record table.
///
/// Also serves as the working set of [`JsonFileStore`](crate::file_store::JsonFileStore),
/// which loads one of these per command and writes it back after mutations.
///
/// Ids are `max(id) + 1`, so BTreeMap ordering keeps both the allocation and
/// `list_all` cheap and deterministic.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: BTreeMap<RecordId, Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from previously persisted records.
    ///
    /// # Errors
    /// - `StoreError::Io` with kind `InvalidData` if two records share an id
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> StoreResult<Self> {
        let mut table = BTreeMap::new();
        for record in records {
            let id = record.id;
            if table.insert(id, record).is_some() {
                return Err(StoreError::Io(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("duplicate record id {id}"),
                )));
            }
        }
        Ok(Self { records: table })
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    fn next_id(&self) -> StoreResult<RecordId> {
        match self.records.last_key_value() {
            None => Ok(1),
            Some((id, _)) => id
                .checked_add(1)
                .ok_or_else(|| StoreError::Invalid("record id space exhausted".into())),
        }
    }
}

impl Store for MemoryStore {
    fn create(&mut self, description: String, status: String) -> StoreResult<Record> {
        let record = Record {
            id: self.next_id()?,
            description,
            status,
            created: Utc::now(),
        };
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    fn update(
        &mut self,
        id: RecordId,
        description: String,
        status: String,
    ) -> StoreResult<Record> {
        let record = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.description = description;
        record.status = status;
        Ok(record.clone())
    }

    fn delete(&mut self, id: RecordId) -> StoreResult<()> {
        self.records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    fn get(&mut self, id: RecordId) -> StoreResult<Record> {
        self.records.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn list_all(&mut self) -> StoreResult<Vec<Record>> {
        Ok(self.records.values().cloned().collect())
    }
}
