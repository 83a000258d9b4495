//! Lectern Types - Core types for projector element composition
//!
//! Lectern drives the projectors of a meeting: every projector shows an
//! ordered composition of elements (slides and widgets), overlay messages and
//! countdowns. This crate contains the data model shared by the daemon and
//! its storage backends.
//!
//! ## Key Concepts
//!
//! - **Projector**: A display surface with its element composition
//! - **Element**: One displayable unit, identified by a server-minted key
//! - **ElementStore**: The keyed element mapping of a single projector
//! - **ProjectionDefault**: A default content slot bound to one projector
//! - **ConfigEntry**: A runtime configuration value
//! - **HistoryEntry**: An audit record with its full data payload

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod config;
pub mod element;
pub mod history;
pub mod ids;
pub mod model;
pub mod models;
pub mod projector;

// Re-export main types
pub use config::{ConfigEntry, PROJECTOR_BROADCAST};
pub use element::{Element, ElementError, ElementMap, ElementStore};
pub use history::{HistoryData, HistoryEntry};
pub use ids::{ElementKey, ElementKeyError, RecordId};
pub use model::{CollectionElement, ElementRef, Model};
pub use models::{ChatMessage, Countdown, ProjectorMessage, Tag};
pub use projector::{ProjectionDefault, Projector, Resolution, ResolutionError, DEFAULT_PROJECTOR_ID};
