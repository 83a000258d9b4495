//! History handlers

use super::DetailResponse;
use crate::access;
use crate::api::rest::extract::Path;
use crate::api::rest::state::AppState;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::history::TimelineEntry;
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::DateTime;
use lectern_types::{HistoryEntry, RecordId};
use serde::Deserialize;

pub async fn list_history(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<HistoryEntry>>> {
    state.authorize(&access::HISTORY, "list", &user).await?;
    Ok(Json(state.history.entries().await?))
}

pub async fn get_history(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<HistoryEntry>> {
    state.authorize(&access::HISTORY, "retrieve", &user).await?;
    Ok(Json(state.history.entry(id).await?))
}

pub async fn clear_history(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<DetailResponse>> {
    state
        .authorize(&access::HISTORY, "clear_history", &user)
        .await?;
    state.history.clear().await?;
    Ok(Json(DetailResponse::new("History was deleted successfully.")))
}

/// Query of the timeline view
#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub timestamp: Option<String>,
}

/// Everything recorded up to `timestamp` (UNIX seconds, 0 or absent for all)
pub async fn timeline(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<TimelineQuery>,
) -> ApiResult<Json<Vec<TimelineEntry>>> {
    state.authorize(&access::HISTORY, "timeline", &user).await?;
    let invalid = || ApiError::invalid("Invalid input. Timestamp  should be an integer.");
    let timestamp = match query.timestamp.as_deref() {
        None => 0,
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| invalid())?,
    };
    let until = if timestamp == 0 {
        None
    } else {
        Some(DateTime::from_timestamp(timestamp, 0).ok_or_else(invalid)?)
    };
    Ok(Json(state.history.timeline(until).await?))
}
