//! Record service built around a single-writer command actor.
//!
//! Any number of threads may create, read, update, delete and list records at
//! once. None of them touch the store: every request becomes a command on one
//! FIFO queue, and a single worker thread applies the commands one at a time
//! and replies to each caller on a private channel. Callers see a plain
//! blocking function call; the store sees strictly sequential access and needs
//! no locks.
//!
//! # Modules
//!
//! - [`actor`]: the worker loop, [`ActorHandle`] and [`spawn_actor`]
//! - `command`: the command protocol and its typed reply slots
//! - [`store`]: the [`Store`] trait, its error type and [`MemoryStore`]
//! - [`file_store`]: [`JsonFileStore`], the on-disk store the binary uses
//! - [`record`]: the [`Record`] data type
//! - [`http`]: axum routes over an [`ActorHandle`]
//! - [`logging`]: tracing setup, log file and id helpers
//! - [`cli`]: command-line configuration for the binary

pub mod actor;
pub mod cli;
pub(crate) mod command;
pub mod file_store;
pub mod http;
pub mod logging;
pub mod record;
pub mod store;

pub use actor::{ActorError, ActorHandle, ActorResult, spawn_actor};
pub use file_store::JsonFileStore;
pub use record::{Record, RecordId};
pub use store::{MemoryStore, Store, StoreError, StoreResult};
