//! Change notifications for connected clients
//!
//! Services report changed and deleted records here after persisting them.
//! Delivery is fire-and-forget: nothing waits for subscribers.

use lectern_types::{CollectionElement, ElementRef, Model};
use serde::Serialize;
use tokio::sync::broadcast;

/// One batch of changes as seen by clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoupdateMessage {
    pub changed: Vec<CollectionElement>,
    pub deleted: Vec<ElementRef>,
}

/// Notification sink
pub trait Notifier: Send + Sync {
    fn inform_changed(&self, elements: Vec<CollectionElement>);

    fn inform_deleted(&self, elements: Vec<ElementRef>);
}

/// Serialize records for [`Notifier::inform_changed`]
pub fn changed<M: Model>(records: &[M]) -> Result<Vec<CollectionElement>, serde_json::Error> {
    records.iter().map(CollectionElement::of).collect()
}

/// Notifier backed by a broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<AutoupdateMessage>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AutoupdateMessage> {
        self.tx.subscribe()
    }

    fn publish(&self, message: AutoupdateMessage) {
        // No subscribers is not an error
        let _ = self.tx.send(message);
    }
}

impl Notifier for BroadcastNotifier {
    fn inform_changed(&self, elements: Vec<CollectionElement>) {
        if elements.is_empty() {
            return;
        }
        tracing::debug!(count = elements.len(), "Informing changed elements");
        self.publish(AutoupdateMessage {
            changed: elements,
            deleted: Vec::new(),
        });
    }

    fn inform_deleted(&self, elements: Vec<ElementRef>) {
        if elements.is_empty() {
            return;
        }
        tracing::debug!(count = elements.len(), "Informing deleted elements");
        self.publish(AutoupdateMessage {
            changed: Vec::new(),
            deleted: elements,
        });
    }
}
