//! In-memory storage implementation

use super::traits::*;
use crate::error::StorageError;
use async_trait::async_trait;
use lectern_types::{
    ChatMessage, ConfigEntry, Countdown, HistoryData, HistoryEntry, Model, ProjectionDefault,
    Projector, ProjectorMessage, RecordId, Tag,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One collection held in memory
#[derive(Debug)]
pub struct MemoryTable<M> {
    rows: RwLock<Rows<M>>,
}

#[derive(Debug)]
struct Rows<M> {
    records: BTreeMap<RecordId, M>,
    last_id: RecordId,
}

impl<M> Default for MemoryTable<M> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Rows {
                records: BTreeMap::new(),
                last_id: 0,
            }),
        }
    }
}

#[async_trait]
impl<M: Model> RecordStorage<M> for MemoryTable<M> {
    async fn get(&self, id: RecordId) -> StorageResult<Option<M>> {
        let rows = self.rows.read().await;
        Ok(rows.records.get(&id).cloned())
    }

    async fn list(&self) -> StorageResult<Vec<M>> {
        let rows = self.rows.read().await;
        Ok(rows.records.values().cloned().collect())
    }

    async fn exists(&self, id: RecordId) -> StorageResult<bool> {
        let rows = self.rows.read().await;
        Ok(rows.records.contains_key(&id))
    }

    async fn insert(&self, mut record: M) -> StorageResult<M> {
        let mut rows = self.rows.write().await;
        if record.id() == 0 {
            rows.last_id += 1;
            record.set_id(rows.last_id);
        } else if rows.records.contains_key(&record.id()) {
            return Err(StorageError::Conflict(record.element_id()));
        } else {
            rows.last_id = rows.last_id.max(record.id());
        }
        rows.records.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn upsert(&self, record: M) -> StorageResult<()> {
        let mut rows = self.rows.write().await;
        rows.last_id = rows.last_id.max(record.id());
        rows.records.insert(record.id(), record);
        Ok(())
    }

    async fn delete(&self, id: RecordId) -> StorageResult<bool> {
        let mut rows = self.rows.write().await;
        Ok(rows.records.remove(&id).is_some())
    }

    async fn clear(&self) -> StorageResult<Vec<RecordId>> {
        let mut rows = self.rows.write().await;
        let removed = std::mem::take(&mut rows.records);
        Ok(removed.into_keys().collect())
    }
}

#[derive(Debug, Default)]
struct HistoryTables {
    entries: BTreeMap<RecordId, HistoryEntry>,
    data: BTreeMap<RecordId, HistoryData>,
    last_entry_id: RecordId,
    last_data_id: RecordId,
}

/// In-memory storage for development and testing
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    projectors: MemoryTable<Projector>,
    projection_defaults: MemoryTable<ProjectionDefault>,
    config_entries: MemoryTable<ConfigEntry>,
    tags: MemoryTable<Tag>,
    chat_messages: MemoryTable<ChatMessage>,
    projector_messages: MemoryTable<ProjectorMessage>,
    countdowns: MemoryTable<Countdown>,
    history: Arc<RwLock<HistoryTables>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    fn projectors(&self) -> &dyn RecordStorage<Projector> {
        &self.projectors
    }

    fn projection_defaults(&self) -> &dyn RecordStorage<ProjectionDefault> {
        &self.projection_defaults
    }

    fn config_entries(&self) -> &dyn RecordStorage<ConfigEntry> {
        &self.config_entries
    }

    fn tags(&self) -> &dyn RecordStorage<Tag> {
        &self.tags
    }

    fn chat_messages(&self) -> &dyn RecordStorage<ChatMessage> {
        &self.chat_messages
    }

    fn projector_messages(&self) -> &dyn RecordStorage<ProjectorMessage> {
        &self.projector_messages
    }

    fn countdowns(&self) -> &dyn RecordStorage<Countdown> {
        &self.countdowns
    }
}

#[async_trait]
impl HistoryStorage for InMemoryStorage {
    async fn list_history(&self) -> StorageResult<Vec<HistoryEntry>> {
        let history = self.history.read().await;
        Ok(history.entries.values().cloned().collect())
    }

    async fn get_history(&self, id: RecordId) -> StorageResult<Option<HistoryEntry>> {
        let history = self.history.read().await;
        Ok(history.entries.get(&id).cloned())
    }

    async fn get_history_data(&self, id: RecordId) -> StorageResult<Option<HistoryData>> {
        let history = self.history.read().await;
        Ok(history.data.get(&id).cloned())
    }

    async fn record_history(
        &self,
        mut entry: HistoryEntry,
        mut data: HistoryData,
    ) -> StorageResult<HistoryEntry> {
        let mut history = self.history.write().await;

        history.last_data_id += 1;
        data.id = history.last_data_id;
        history.last_entry_id += 1;
        entry.id = history.last_entry_id;
        entry.full_data_id = data.id;

        history.data.insert(data.id, data);
        history.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn clear_history(&self) -> StorageResult<Vec<RecordId>> {
        let mut history = self.history.write().await;
        history.data.clear();
        let removed = std::mem::take(&mut history.entries);
        Ok(removed.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_tag_crud() {
        let storage = InMemoryStorage::new();

        // Create
        let tag = storage
            .tags()
            .insert(Tag {
                id: 0,
                name: "Budget".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(tag.id, 1);

        // Read
        let retrieved = storage.tags().get(tag.id).await.unwrap();
        assert_eq!(retrieved.unwrap().name, "Budget");

        // List
        let tags = storage.tags().list().await.unwrap();
        assert_eq!(tags.len(), 1);

        // Delete
        assert!(storage.tags().delete(tag.id).await.unwrap());
        assert!(storage.tags().get(tag.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_with_explicit_id_advances_sequence() {
        let storage = InMemoryStorage::new();
        let mut projector = Projector::new("Default projector");
        projector.id = 5;
        storage.projectors().insert(projector).await.unwrap();

        let next = storage
            .projectors()
            .insert(Projector::new("Side"))
            .await
            .unwrap();
        assert_eq!(next.id, 6);
    }

    #[tokio::test]
    async fn test_insert_rejects_taken_id() {
        let storage = InMemoryStorage::new();
        storage
            .projectors()
            .insert(Projector::new("Default projector"))
            .await
            .unwrap();

        let mut duplicate = Projector::new("Duplicate");
        duplicate.id = 1;
        let err = storage.projectors().insert(duplicate).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(ref id) if id == "core/projector:1"));
        assert_eq!(
            storage.projectors().get(1).await.unwrap().unwrap().name,
            "Default projector"
        );
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_clear() {
        let storage = InMemoryStorage::new();
        let countdowns = storage.countdowns();
        for _ in 0..2 {
            countdowns
                .insert(serde_json::from_str("{}").unwrap())
                .await
                .unwrap();
        }
        assert_eq!(countdowns.clear().await.unwrap(), vec![1, 2]);
        let next = countdowns
            .insert(serde_json::from_str("{}").unwrap())
            .await
            .unwrap();
        assert_eq!(next.id, 3);
    }

    #[tokio::test]
    async fn test_history_clear_cascades_to_data() {
        let storage = InMemoryStorage::new();
        let entry = storage
            .record_history(
                HistoryEntry {
                    id: 0,
                    element_id: "core/tag:1".to_string(),
                    now: Utc::now(),
                    information: vec![],
                    user_id: None,
                    full_data_id: 0,
                },
                HistoryData {
                    id: 0,
                    full_data: serde_json::json!({"id": 1, "name": "Budget"}),
                },
            )
            .await
            .unwrap();
        assert!(storage
            .get_history_data(entry.full_data_id)
            .await
            .unwrap()
            .is_some());

        let removed = storage.clear_history().await.unwrap();
        assert_eq!(removed, vec![entry.id]);
        assert!(storage.list_history().await.unwrap().is_empty());
        assert!(storage
            .get_history_data(entry.full_data_id)
            .await
            .unwrap()
            .is_none());
    }
}
