use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a record by the store on creation.
pub type RecordId = u64;

/// A single managed record.
///
/// `description` and `status` are the only mutable fields; `created` is
/// stamped once by the store and carried unchanged through every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub description: String,
    pub status: String,
    pub created: DateTime<Utc>,
}
