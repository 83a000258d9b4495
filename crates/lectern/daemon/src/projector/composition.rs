//! Element mapping transitions
//!
//! Each function takes the current mapping and returns the complete new one.
//! Nothing here touches storage; inputs are already shape-checked.

use lectern_types::{Element, ElementKey, ElementMap, ElementStore};
use serde_json::{Map, Value};
use thiserror::Error;

/// A referenced key is not part of the mapping
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("Invalid projector element. Wrong UUID.")]
    WrongKey(ElementKey),

    #[error("Invalid UUID.")]
    UnknownKey(ElementKey),
}

fn with_fresh_keys(mut mapping: ElementMap, elements: Vec<Element>) -> ElementMap {
    for element in elements {
        mapping.insert(ElementKey::generate(), element);
    }
    mapping
}

/// Current mapping plus every element under a fresh key
pub fn added(store: &ElementStore, elements: Vec<Element>) -> ElementMap {
    with_fresh_keys(store.snapshot(), elements)
}

/// Stable entries plus every element under a fresh key
pub fn pruned(store: &ElementStore, elements: Vec<Element>) -> ElementMap {
    with_fresh_keys(store.stable(), elements)
}

/// Stable entries only
pub fn cleared(store: &ElementStore) -> ElementMap {
    pruned(store, Vec::new())
}

/// Shallow-merge each partial into the element it names
pub fn updated(
    store: &ElementStore,
    updates: Vec<(ElementKey, Map<String, Value>)>,
) -> Result<ElementMap, CompositionError> {
    let mut mapping = store.snapshot();
    for (key, partial) in updates {
        match mapping.get_mut(&key) {
            Some(element) => element.merge(partial),
            None => return Err(CompositionError::WrongKey(key)),
        }
    }
    Ok(mapping)
}

/// Drop the listed keys; any unknown key rejects the whole batch
pub fn deactivated(
    store: &ElementStore,
    keys: Vec<ElementKey>,
) -> Result<ElementMap, CompositionError> {
    let mut mapping = store.snapshot();
    for key in keys {
        if mapping.remove(&key).is_none() {
            return Err(CompositionError::UnknownKey(key));
        }
    }
    Ok(mapping)
}
