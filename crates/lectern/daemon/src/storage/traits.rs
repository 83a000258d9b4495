//! Storage trait definitions
//!
//! Stores are plain record stores. Read-compute-write sequences that must not
//! interleave are serialized by the services above them.

use crate::error::StorageError;
use async_trait::async_trait;
use lectern_types::{
    ChatMessage, ConfigEntry, Countdown, HistoryData, HistoryEntry, Model, ProjectionDefault,
    Projector, ProjectorMessage, RecordId, Tag,
};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Combined storage trait
pub trait Storage: HistoryStorage + Send + Sync {
    fn projectors(&self) -> &dyn RecordStorage<Projector>;

    fn projection_defaults(&self) -> &dyn RecordStorage<ProjectionDefault>;

    fn config_entries(&self) -> &dyn RecordStorage<ConfigEntry>;

    fn tags(&self) -> &dyn RecordStorage<Tag>;

    fn chat_messages(&self) -> &dyn RecordStorage<ChatMessage>;

    fn projector_messages(&self) -> &dyn RecordStorage<ProjectorMessage>;

    fn countdowns(&self) -> &dyn RecordStorage<Countdown>;
}

/// Storage for the records of one collection
#[async_trait]
pub trait RecordStorage<M: Model>: Send + Sync {
    /// Get a record by ID
    async fn get(&self, id: RecordId) -> StorageResult<Option<M>>;

    /// List all records ordered by ID
    async fn list(&self) -> StorageResult<Vec<M>>;

    /// Check whether a record exists
    async fn exists(&self, id: RecordId) -> StorageResult<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Store a new record, assigning the next free ID when its ID is 0
    async fn insert(&self, record: M) -> StorageResult<M>;

    /// Create or update a record
    async fn upsert(&self, record: M) -> StorageResult<()>;

    /// Delete a record by ID
    async fn delete(&self, id: RecordId) -> StorageResult<bool>;

    /// Delete all records, returning the removed IDs
    async fn clear(&self) -> StorageResult<Vec<RecordId>>;
}

/// Storage for the history log and its full data payloads
#[async_trait]
pub trait HistoryStorage: Send + Sync {
    /// List all entries ordered by ID
    async fn list_history(&self) -> StorageResult<Vec<HistoryEntry>>;

    /// Get an entry by ID
    async fn get_history(&self, id: RecordId) -> StorageResult<Option<HistoryEntry>>;

    /// Get a full data payload by ID
    async fn get_history_data(&self, id: RecordId) -> StorageResult<Option<HistoryData>>;

    /// Store a payload and an entry pointing at it (IDs are assigned here)
    async fn record_history(
        &self,
        entry: HistoryEntry,
        data: HistoryData,
    ) -> StorageResult<HistoryEntry>;

    /// Delete all payloads together with their entries, returning the removed entry IDs
    async fn clear_history(&self) -> StorageResult<Vec<RecordId>>;
}
