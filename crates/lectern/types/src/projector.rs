//! Projectors and projection defaults

use crate::{ElementStore, Model, RecordId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Projector that orphaned projection defaults fall back to
pub const DEFAULT_PROJECTOR_ID: RecordId = 1;

/// A display surface showing a composition of elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projector {
    #[serde(default)]
    pub id: RecordId,

    #[serde(default)]
    pub name: String,

    /// Current composition, keyed by server-minted element keys
    #[serde(default)]
    pub elements: ElementStore,

    /// Relative zoom level
    #[serde(default)]
    pub scale: i32,

    /// Relative scroll offset
    #[serde(default)]
    pub scroll: i32,

    #[serde(default = "default_width")]
    pub width: i32,

    #[serde(default = "default_height")]
    pub height: i32,

    /// Video blank state
    #[serde(default)]
    pub blank: bool,
}

fn default_width() -> i32 {
    1220
}

fn default_height() -> i32 {
    915
}

impl Projector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            elements: ElementStore::default(),
            scale: 0,
            scroll: 0,
            width: default_width(),
            height: default_height(),
            blank: false,
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }
}

impl Model for Projector {
    const COLLECTION: &'static str = "core/projector";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

/// Projector resolution in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: i32,
    pub height: i32,
}

/// Resolution outside of the supported range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The Resolution have to be between 800x340 and 3840x2880.")]
pub struct ResolutionError;

impl Resolution {
    pub const MIN_WIDTH: i32 = 800;
    pub const MAX_WIDTH: i32 = 3840;
    pub const MIN_HEIGHT: i32 = 340;
    pub const MAX_HEIGHT: i32 = 2880;

    pub fn new(width: i32, height: i32) -> Result<Self, ResolutionError> {
        let resolution = Self { width, height };
        resolution.validate()?;
        Ok(resolution)
    }

    pub fn validate(&self) -> Result<(), ResolutionError> {
        let width_ok = (Self::MIN_WIDTH..=Self::MAX_WIDTH).contains(&self.width);
        let height_ok = (Self::MIN_HEIGHT..=Self::MAX_HEIGHT).contains(&self.height);
        if width_ok && height_ok {
            Ok(())
        } else {
            Err(ResolutionError)
        }
    }
}

/// A default content slot (agenda, motions, ...), bound to one projector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionDefault {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
    pub display_name: String,
    pub projector_id: RecordId,
}

impl ProjectionDefault {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        projector_id: RecordId,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            display_name: display_name.into(),
            projector_id,
        }
    }
}

impl Model for ProjectionDefault {
    const COLLECTION: &'static str = "core/projection-default";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}
