//! The command actor: a single worker thread that owns the store.
//!
//! Callers talk to the worker through an [`ActorHandle`]. Every operation is
//! turned into a [`Command`] carrying a private reply channel, pushed onto one
//! unbounded FIFO intake queue, and answered by the worker once the store call
//! has finished. The worker applies commands strictly one at a time, so the
//! Nth command's effects are committed (or have failed) before the (N+1)th
//! starts, and the store needs no locks of its own.
//!
//! # Lifecycle
//!
//! [`spawn_actor`] moves the store onto a dedicated `record-actor` thread.
//! The worker stops when either:
//!
//! - **the intake queue closes** (every handle dropped): commands already
//!   queued are still applied and answered, then the loop exits;
//! - **the cancellation signal fires** (a message arrives or every sender is
//!   dropped): the loop exits without applying queued commands. Their reply
//!   channels are dropped, so their callers get [`ActorError::ActorStopped`].
//!
//! Submitting to a stopped actor fails fast with [`ActorError::ActorStopped`];
//! a call never blocks forever on a worker that is gone.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::command::{Command, Reply};
use crate::record::{Record, RecordId};
use crate::store::{Store, StoreError, StoreResult};

/// Errors surfaced by [`ActorHandle`] calls.
#[derive(Debug, Error)]
pub enum ActorError {
    /// The store rejected the operation. Relayed exactly as reported.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The worker has exited; the command was not (or will not be) applied.
    #[error("record actor has stopped")]
    ActorStopped,
    /// No reply within the handle's call timeout. The command stays queued and
    /// is still applied exactly once; its reply is discarded.
    #[error("no reply from record actor within {0:?}")]
    Timeout(Duration),
}

pub type ActorResult<T> = Result<T, ActorError>;

/// Cloneable, blocking client for the command actor.
///
/// Each call blocks the calling thread until the worker replies. From async
/// code, run calls inside `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct ActorHandle {
    command_tx: Sender<Command>,
    call_timeout: Option<Duration>,
}

impl ActorHandle {
    /// Returns a handle to the same actor whose calls give up after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            call_timeout: Some(timeout),
        }
    }

    /// Number of commands waiting in the intake queue.
    pub fn queued(&self) -> usize {
        self.command_tx.len()
    }

    /// Creates a record and returns it with its store-assigned id.
    pub fn create(
        &self,
        description: impl Into<String>,
        status: impl Into<String>,
    ) -> ActorResult<Record> {
        let (reply, rx) = Reply::channel();
        self.call(
            Command::Create {
                description: description.into(),
                status: status.into(),
                reply,
            },
            rx,
        )
    }

    /// Replaces the mutable fields of record `id`.
    ///
    /// # Errors
    /// - `StoreError::NotFound` if no record has that id
    pub fn update(
        &self,
        id: RecordId,
        description: impl Into<String>,
        status: impl Into<String>,
    ) -> ActorResult<Record> {
        let (reply, rx) = Reply::channel();
        self.call(
            Command::Update {
                id,
                description: description.into(),
                status: status.into(),
                reply,
            },
            rx,
        )
    }

    /// Deletes record `id`.
    ///
    /// # Errors
    /// - `StoreError::NotFound` if no record has that id
    pub fn delete(&self, id: RecordId) -> ActorResult<()> {
        let (reply, rx) = Reply::channel();
        self.call(Command::Delete { id, reply }, rx)
    }

    /// Returns every record, ordered by id.
    pub fn list_all(&self) -> ActorResult<Vec<Record>> {
        let (reply, rx) = Reply::channel();
        self.call(Command::ListAll { reply }, rx)
    }

    /// Fetches record `id`.
    ///
    /// # Errors
    /// - `StoreError::NotFound` if no record has that id
    pub fn get(&self, id: RecordId) -> ActorResult<Record> {
        let (reply, rx) = Reply::channel();
        self.call(Command::Get { id, reply }, rx)
    }

    fn call<T>(&self, command: Command, reply_rx: Receiver<StoreResult<T>>) -> ActorResult<T> {
        self.command_tx
            .send(command)
            .map_err(|_| ActorError::ActorStopped)?;

        let outcome = match self.call_timeout {
            None => reply_rx.recv().map_err(|_| ActorError::ActorStopped)?,
            Some(timeout) => match reply_rx.recv_timeout(timeout) {
                Ok(outcome) => outcome,
                Err(RecvTimeoutError::Timeout) => return Err(ActorError::Timeout(timeout)),
                Err(RecvTimeoutError::Disconnected) => return Err(ActorError::ActorStopped),
            },
        };
        outcome.map_err(ActorError::from)
    }
}

/// Starts the command actor on its own thread.
///
/// The store is moved into the worker; from here on it is reachable only
/// through the returned handle. `cancel` stops the worker as soon as it
/// yields a message or its senders are all dropped, so tying the sender to a
/// scope bounds the actor's lifetime to that scope.
///
/// The join handle resolves once the worker has exited.
///
/// # Errors
/// Returns an error if the OS refuses to spawn the thread.
pub fn spawn_actor<S>(store: S, cancel: Receiver<()>) -> io::Result<(ActorHandle, JoinHandle<()>)>
where
    S: Store + Send + 'static,
{
    let (command_tx, command_rx) = unbounded();
    let worker = thread::Builder::new()
        .name("record-actor".to_string())
        .spawn(move || Worker::new(store, command_rx, cancel).run())?;

    Ok((
        ActorHandle {
            command_tx,
            call_timeout: None,
        },
        worker,
    ))
}

/// Owns the store and applies commands in intake order.
struct Worker<S> {
    store: S,
    command_rx: Receiver<Command>,
    cancel_rx: Receiver<()>,
    applied: u64,
}

impl<S: Store> Worker<S> {
    fn new(store: S, command_rx: Receiver<Command>, cancel_rx: Receiver<()>) -> Self {
        Self {
            store,
            command_rx,
            cancel_rx,
            applied: 0,
        }
    }

    fn run(mut self) {
        info!("record actor started");
        while let Some(command) = self.next_command() {
            self.handle_command(command);
        }

        // Anything still queued after cancellation is dropped unanswered.
        let abandoned = self.command_rx.try_iter().count();
        info!(applied = self.applied, abandoned, "record actor stopped");
    }

    /// Waits for the next command. `None` means the loop must exit.
    ///
    /// A cancellation that races with a ready command wins: the command is
    /// dropped rather than applied.
    fn next_command(&self) -> Option<Command> {
        crossbeam_channel::select! {
            recv(self.command_rx) -> command => match command {
                Ok(command) if !self.cancelled() => Some(command),
                Ok(_) => None,
                Err(_) => {
                    debug!("intake queue closed");
                    None
                }
            },
            recv(self.cancel_rx) -> _ => {
                debug!("cancellation received");
                None
            }
        }
    }

    fn cancelled(&self) -> bool {
        !matches!(self.cancel_rx.try_recv(), Err(TryRecvError::Empty))
    }

    fn handle_command(&mut self, command: Command) {
        let kind = command.kind();
        self.applied += 1;
        debug!(seq = self.applied, command = kind, "applying command");

        let delivered = match command {
            Command::Create {
                description,
                status,
                reply,
            } => finish(kind, self.store.create(description, status), reply),
            Command::Update {
                id,
                description,
                status,
                reply,
            } => finish(kind, self.store.update(id, description, status), reply),
            Command::Delete { id, reply } => finish(kind, self.store.delete(id), reply),
            Command::ListAll { reply } => finish(kind, self.store.list_all(), reply),
            Command::Get { id, reply } => finish(kind, self.store.get(id), reply),
        };

        if !delivered {
            debug!(seq = self.applied, command = kind, "caller stopped waiting, reply discarded");
        }
    }
}

fn finish<T>(kind: &'static str, result: StoreResult<T>, reply: Reply<T>) -> bool {
    if let Err(err) = &result {
        warn!(command = kind, error = %err, "store rejected command");
    }
    reply.send(result)
}
