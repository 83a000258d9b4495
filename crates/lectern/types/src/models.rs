//! Plain collection records: tags, chat, overlay messages and countdowns

use crate::{Model, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! impl_model {
    ($ty:ty, $collection:literal) => {
        impl Model for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> RecordId {
                self.id
            }

            fn set_id(&mut self, id: RecordId) {
                self.id = id;
            }
        }
    };
}

/// Free-form label attached to agenda items, motions, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
}

/// Chat message; author and timestamp are stamped by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: RecordId,
    pub message: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<RecordId>,
}

/// Overlay message shown on projectors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectorMessage {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub message: String,
}

/// Countdown timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    #[serde(default)]
    pub id: RecordId,

    #[serde(default)]
    pub description: String,

    /// Length in seconds the countdown resets to
    #[serde(default = "default_countdown_time")]
    pub default_time: i64,

    /// Seconds left while stopped, end timestamp while running
    #[serde(default = "default_countdown_seconds")]
    pub countdown_time: f64,

    #[serde(default)]
    pub running: bool,
}

fn default_countdown_time() -> i64 {
    60
}

fn default_countdown_seconds() -> f64 {
    60.0
}

impl_model!(Tag, "core/tag");
impl_model!(ChatMessage, "core/chat-message");
impl_model!(ProjectorMessage, "core/projector-message");
impl_model!(Countdown, "core/countdown");
