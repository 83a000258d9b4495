//! Identifiers for Lectern records and projector elements
//!
//! Records use integer ids assigned by the store. Projector elements use
//! 128-bit random keys rendered as 32 hex digits.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Store-assigned identifier of a record
pub type RecordId = i64;

/// Key of one element inside a projector's element mapping
///
/// Fresh keys are only minted by the server. Clients may reference existing
/// keys but a parsed key is not guaranteed to exist anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElementKey(String);

/// A string that is not a 32 hex digit key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid element key: {0:?}")]
pub struct ElementKeyError(pub String);

impl ElementKey {
    /// Length of a key in hex digits
    pub const LEN: usize = 32;

    /// Mint a fresh random key (UUIDv4, lowercase simple form)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Check the syntax of a client supplied key
    pub fn parse(raw: &str) -> Result<Self, ElementKeyError> {
        let lower_hex = raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if raw.len() == Self::LEN && lower_hex {
            Ok(Self(raw.to_string()))
        } else {
            Err(ElementKeyError(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ElementKey {
    type Error = ElementKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ElementKey> for String {
    fn from(key: ElementKey) -> Self {
        key.0
    }
}
