//! Projector elements and the per-projector element store
//!
//! An element is an open map of display fields. Only `name` and `stable` carry
//! meaning here; everything else is passed through to the clients untouched.

use crate::ElementKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Keyed element mapping of one projector
pub type ElementMap = BTreeMap<ElementKey, Element>;

/// Reasons a JSON value is not a valid element
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    #[error("All elements have to be dicts.")]
    NotAnObject,

    #[error("Invalid projector element. Name is missing.")]
    MissingName,
}

/// One displayable unit of a projector composition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Element(Map<String, Value>);

impl Element {
    /// Build an element from a wire value, requiring an object with a non-null `name`
    pub fn from_value(value: Value) -> Result<Self, ElementError> {
        match value {
            Value::Object(fields) => Self::from_fields(fields),
            _ => Err(ElementError::NotAnObject),
        }
    }

    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, ElementError> {
        match fields.get("name") {
            None | Some(Value::Null) => Err(ElementError::MissingName),
            Some(_) => Ok(Self(fields)),
        }
    }

    /// Symbolic slide type, e.g. `core/countdown`
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// Stable elements survive prune and clear
    pub fn is_stable(&self) -> bool {
        self.0.get("stable").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Shallow merge: every field of `partial` overwrites the field of the same name
    pub fn merge(&mut self, partial: Map<String, Value>) {
        for (field, value) in partial {
            self.0.insert(field, value);
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

/// The element mapping of one projector
///
/// Mutations never patch the mapping in place: callers compute the complete new
/// mapping from a [`snapshot`](Self::snapshot) and install it with
/// [`replace`](Self::replace).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementStore {
    entries: ElementMap,
}

impl ElementStore {
    pub fn new(entries: ElementMap) -> Self {
        Self { entries }
    }

    /// Current contents
    pub fn snapshot(&self) -> ElementMap {
        self.entries.clone()
    }

    /// Swap the entire mapping
    pub fn replace(&mut self, entries: ElementMap) {
        self.entries = entries;
    }

    /// Entries flagged `stable`
    pub fn stable(&self) -> ElementMap {
        self.entries
            .iter()
            .filter(|(_, element)| element.is_stable())
            .map(|(key, element)| (key.clone(), element.clone()))
            .collect()
    }

    pub fn get(&self, key: &ElementKey) -> Option<&Element> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &ElementKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ElementKey, &Element)> {
        self.entries.iter()
    }
}

impl From<ElementMap> for ElementStore {
    fn from(entries: ElementMap) -> Self {
        Self::new(entries)
    }
}
