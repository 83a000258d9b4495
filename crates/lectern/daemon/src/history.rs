//! History log: initial build, clearing and the timeline view

use crate::autoupdate::{self, Notifier};
use crate::error::{ApiError, ApiResult};
use crate::storage::{HistoryStorage, RecordStorage, Storage};
use chrono::{DateTime, Utc};
use lectern_types::{ElementRef, HistoryData, HistoryEntry, Model, RecordId};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Information recorded for every element of a fresh build
pub const INITIAL_VERSION: &str = "Initial version";

/// One element of the timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub full_data: Value,
    pub element_id: String,
    /// UNIX timestamp of the entry
    pub timestamp: f64,
    pub information: Vec<String>,
    pub user_id: Option<RecordId>,
}

/// History maintenance
pub struct HistoryService {
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    // Serializes clear and rebuild
    rebuild: Mutex<()>,
}

async fn snapshot<M: Model>(table: &dyn RecordStorage<M>) -> ApiResult<Vec<(String, Value)>> {
    table
        .list()
        .await?
        .iter()
        .map(|record| -> ApiResult<(String, Value)> {
            Ok((record.element_id(), serde_json::to_value(record)?))
        })
        .collect()
}

impl HistoryService {
    pub fn new(storage: Arc<dyn Storage>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            storage,
            notifier,
            rebuild: Mutex::new(()),
        }
    }

    pub async fn entries(&self) -> ApiResult<Vec<HistoryEntry>> {
        Ok(self.storage.list_history().await?)
    }

    pub async fn entry(&self, id: RecordId) -> ApiResult<HistoryEntry> {
        self.storage
            .get_history(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))
    }

    /// Record the current state of every element, if the log is empty
    pub async fn build_if_empty(&self) -> ApiResult<usize> {
        let _guard = self.rebuild.lock().await;
        if !self.storage.list_history().await?.is_empty() {
            return Ok(0);
        }
        Ok(self.build().await?.len())
    }

    /// Delete the whole log and build it again from the current state
    ///
    /// Clients are told about every removed entry before the rebuilt entries
    /// are announced.
    pub async fn clear(&self) -> ApiResult<usize> {
        let _guard = self.rebuild.lock().await;

        let removed = self.storage.clear_history().await?;
        let removed_count = removed.len();
        self.notifier.inform_deleted(
            removed
                .into_iter()
                .map(|id| ElementRef::new(HistoryEntry::COLLECTION, id))
                .collect(),
        );

        let rebuilt = self.build().await?;
        self.notifier.inform_changed(autoupdate::changed(&rebuilt)?);
        tracing::info!(removed = removed_count, rebuilt = rebuilt.len(), "History rebuilt");
        Ok(rebuilt.len())
    }

    // Callers hold the rebuild lock
    async fn build(&self) -> ApiResult<Vec<HistoryEntry>> {
        let storage = self.storage.as_ref();
        let mut elements = Vec::new();
        elements.extend(snapshot(storage.projectors()).await?);
        elements.extend(snapshot(storage.projection_defaults()).await?);
        elements.extend(snapshot(storage.config_entries()).await?);
        elements.extend(snapshot(storage.tags()).await?);
        elements.extend(snapshot(storage.chat_messages()).await?);
        elements.extend(snapshot(storage.projector_messages()).await?);
        elements.extend(snapshot(storage.countdowns()).await?);

        let now = Utc::now();
        let mut entries = Vec::with_capacity(elements.len());
        for (element_id, full_data) in elements {
            let entry = HistoryEntry {
                id: 0,
                element_id,
                now,
                information: vec![INITIAL_VERSION.to_string()],
                user_id: None,
                full_data_id: 0,
            };
            let data = HistoryData { id: 0, full_data };
            entries.push(self.storage.record_history(entry, data).await?);
        }
        tracing::debug!(count = entries.len(), "History built");
        Ok(entries)
    }

    /// Entries up to and including `until`, all entries when `None`
    pub async fn timeline(&self, until: Option<DateTime<Utc>>) -> ApiResult<Vec<TimelineEntry>> {
        let mut timeline = Vec::new();
        for entry in self.storage.list_history().await? {
            if until.is_some_and(|until| entry.now > until) {
                continue;
            }
            let full_data = self
                .storage
                .get_history_data(entry.full_data_id)
                .await?
                .map(|data| data.full_data)
                .unwrap_or(Value::Null);
            timeline.push(TimelineEntry {
                full_data,
                element_id: entry.element_id,
                timestamp: entry.now.timestamp_micros() as f64 / 1_000_000.0,
                information: entry.information,
                user_id: entry.user_id,
            });
        }
        Ok(timeline)
    }
}
