//! History log records

use crate::{Model, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded version of an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: RecordId,

    /// `collection:id` of the recorded element
    pub element_id: String,

    pub now: DateTime<Utc>,

    pub information: Vec<String>,

    pub user_id: Option<RecordId>,

    /// Id of the [`HistoryData`] payload
    pub full_data_id: RecordId,
}

impl Model for HistoryEntry {
    const COLLECTION: &'static str = "core/history";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

/// Full serialized data of an element at the time of a history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryData {
    #[serde(default)]
    pub id: RecordId,
    pub full_data: serde_json::Value,
}
