//! Server time and version views

use crate::api::rest::state::AppState;
use crate::config::PluginInfo;
use axum::{extract::State, Json};
use serde::Serialize;

/// Current server time as UNIX timestamp
pub async fn servertime() -> Json<f64> {
    let now = chrono::Utc::now();
    Json(now.timestamp_micros() as f64 / 1_000_000.0)
}

/// Version view response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub openslides_version: String,
    pub openslides_license: String,
    pub openslides_url: String,
    pub plugins: Vec<PluginInfo>,
}

pub async fn version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        openslides_version: state.version.clone(),
        openslides_license: state.app.license.clone(),
        openslides_url: state.app.url.clone(),
        plugins: state.app.plugins.clone(),
    })
}
