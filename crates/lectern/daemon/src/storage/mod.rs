//! Storage layer for lectern-daemon
//!
//! Provides record storage for every core collection and the history log.

mod memory;
mod traits;

pub use memory::InMemoryStorage;
pub use traits::{HistoryStorage, RecordStorage, Storage, StorageResult};
