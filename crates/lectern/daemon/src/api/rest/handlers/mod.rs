//! API request handlers

pub mod autoupdate;
pub mod chat;
pub mod config;
pub mod history;
pub mod projectors;
pub mod resources;
pub mod system;

use serde::Serialize;

/// `{detail}` response of the action endpoints
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
