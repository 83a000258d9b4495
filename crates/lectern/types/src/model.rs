//! Collection records and change notification payloads

use crate::RecordId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record stored in a named collection
pub trait Model: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection string, e.g. `core/projector`
    const COLLECTION: &'static str;

    fn id(&self) -> RecordId;

    fn set_id(&mut self, id: RecordId);

    /// `collection:id`, the key history entries are recorded under
    fn element_id(&self) -> String {
        format!("{}:{}", Self::COLLECTION, self.id())
    }
}

/// Reference to one record of a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    pub collection: String,
    pub id: RecordId,
}

impl ElementRef {
    pub fn new(collection: impl Into<String>, id: RecordId) -> Self {
        Self {
            collection: collection.into(),
            id,
        }
    }

    pub fn of<M: Model>(record: &M) -> Self {
        Self::new(M::COLLECTION, record.id())
    }
}

/// A changed record together with its full data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionElement {
    pub collection: String,
    pub id: RecordId,
    pub data: serde_json::Value,
}

impl CollectionElement {
    pub fn of<M: Model>(record: &M) -> Result<Self, serde_json::Error> {
        Ok(Self {
            collection: M::COLLECTION.to_string(),
            id: record.id(),
            data: serde_json::to_value(record)?,
        })
    }

    pub fn element_ref(&self) -> ElementRef {
        ElementRef::new(self.collection.clone(), self.id)
    }
}
