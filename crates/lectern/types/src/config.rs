//! Runtime configuration entries

use crate::{Model, RecordId};
use serde::{Deserialize, Serialize};

/// Id of the projector mirrored onto all others, 0 when nothing is broadcast
pub const PROJECTOR_BROADCAST: &str = "projector_broadcast";

/// One stored config value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    #[serde(default)]
    pub id: RecordId,
    pub key: String,
    pub value: serde_json::Value,
}

impl Model for ConfigEntry {
    const COLLECTION: &'static str = "core/config";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}
