//! Reactive state store for LogLine UIs.
//!
//! State is a single JSON object tree addressed with dotted paths.
//! Writes notify subscribers on the written path, its ancestors and the
//! `*` wildcard; middleware observes every action before it is applied;
//! selected subtrees are mirrored into a [`Storage`] sink and can be
//! loaded back at startup.

mod error;
mod events;
pub mod storage;
mod store;

pub use error::{StateError, StorageError};
pub use events::{Action, ActionKind, ChangeEvent};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{StateStore, StoreOptions, SubscriptionId};
