//! Chat actions beyond generic CRUD

use super::DetailResponse;
use crate::access;
use crate::api::rest::state::AppState;
use crate::auth::CurrentUser;
use crate::autoupdate::Notifier;
use crate::error::ApiResult;
use crate::storage::Storage;
use axum::{extract::State, Json};
use lectern_types::{ChatMessage, ElementRef, Model};

/// Delete every chat message
pub async fn clear_chat(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<DetailResponse>> {
    state.authorize(&access::CHAT_MESSAGE, "clear", &user).await?;
    let removed = state.storage.chat_messages().clear().await?;
    tracing::info!(count = removed.len(), "Cleared chat messages");
    state.notifier.inform_deleted(
        removed
            .into_iter()
            .map(|id| ElementRef::new(ChatMessage::COLLECTION, id))
            .collect(),
    );
    Ok(Json(DetailResponse::new(
        "All chat messages deleted successfully.",
    )))
}
