//! Config handlers

use crate::access;
use crate::api::rest::extract::{Path, Payload};
use crate::api::rest::state::AppState;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use axum::{extract::State, Json};
use lectern_types::ConfigEntry;
use serde::Serialize;
use serde_json::Value;

/// Response of a config update
#[derive(Debug, Serialize)]
pub struct ConfigValueResponse {
    pub key: String,
    pub value: Value,
}

pub async fn list_config(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<ConfigEntry>>> {
    state.authorize(&access::CONFIG, "list", &user).await?;
    Ok(Json(state.config.list().await?))
}

pub async fn get_config(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(key): Path<String>,
) -> ApiResult<Json<ConfigEntry>> {
    state.authorize(&access::CONFIG, "retrieve", &user).await?;
    Ok(Json(state.config.entry(&key).await?))
}

async fn apply_update(
    state: &AppState,
    action: &str,
    user: &CurrentUser,
    key: String,
    body: Value,
) -> ApiResult<Json<ConfigValueResponse>> {
    state
        .authorize_key(&access::CONFIG, action, user, Some(&key))
        .await?;
    let value = match body {
        Value::Object(mut body) => body.remove("value").filter(|value| !value.is_null()),
        _ => None,
    }
    .ok_or_else(|| ApiError::invalid("Invalid input. Config value is missing."))?;

    let entry = state.config.update(&key, value).await?;
    Ok(Json(ConfigValueResponse {
        key: entry.key,
        value: entry.value,
    }))
}

pub async fn update_config(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(key): Path<String>,
    Payload(body): Payload,
) -> ApiResult<Json<ConfigValueResponse>> {
    apply_update(&state, "update", &user, key, body).await
}

pub async fn partial_update_config(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(key): Path<String>,
    Payload(body): Payload,
) -> ApiResult<Json<ConfigValueResponse>> {
    apply_update(&state, "partial_update", &user, key, body).await
}
