//! Messages accepted by the command actor.
//!
//! Each variant carries its own reply slot typed for that operation, so a
//! create can only ever be answered with a record and a delete only with an
//! acknowledgement.

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::record::{Record, RecordId};
use crate::store::StoreResult;

/// Single-use reply destination bound to exactly one [`Command`].
///
/// Sending consumes the slot, so a command can be answered at most once.
/// Dropping it unanswered disconnects the waiting caller.
pub(crate) struct Reply<T> {
    tx: Sender<StoreResult<T>>,
}

impl<T> Reply<T> {
    /// Creates a fresh slot and the receiver the caller blocks on.
    pub(crate) fn channel() -> (Self, Receiver<StoreResult<T>>) {
        let (tx, rx) = bounded(1);
        (Self { tx }, rx)
    }

    /// Delivers the outcome. Returns `false` if the caller stopped waiting.
    pub(crate) fn send(self, result: StoreResult<T>) -> bool {
        self.tx.send(result).is_ok()
    }
}

pub(crate) enum Command {
    Create {
        description: String,
        status: String,
        reply: Reply<Record>,
    },
    Update {
        id: RecordId,
        description: String,
        status: String,
        reply: Reply<Record>,
    },
    Delete {
        id: RecordId,
        reply: Reply<()>,
    },
    ListAll {
        reply: Reply<Vec<Record>>,
    },
    Get {
        id: RecordId,
        reply: Reply<Record>,
    },
}

impl Command {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
            Command::ListAll { .. } => "list_all",
            Command::Get { .. } => "get",
        }
    }
}
