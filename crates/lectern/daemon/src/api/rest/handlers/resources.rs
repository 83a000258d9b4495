//! Generic CRUD for the simple collections

use crate::api::rest::extract::{Path, Payload};
use crate::access::{self, AccessTable};
use crate::api::rest::state::AppState;
use crate::auth::CurrentUser;
use crate::autoupdate::{self, Notifier};
use crate::error::{ApiError, ApiResult};
use crate::storage::{RecordStorage, Storage};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::Utc;
use lectern_types::{ChatMessage, Countdown, ElementRef, Model, ProjectorMessage, RecordId, Tag};
use serde_json::Value;

fn invalid_data(err: serde_json::Error) -> ApiError {
    ApiError::invalid(err.to_string())
}

/// A collection served through the generic handlers
pub trait Resource: Model {
    fn access() -> &'static AccessTable;

    fn records(storage: &dyn Storage) -> &dyn RecordStorage<Self>;

    /// Build a new record from a create body
    fn from_payload(body: Value, _user: &CurrentUser) -> ApiResult<Self> {
        let mut record: Self = serde_json::from_value(body).map_err(invalid_data)?;
        record.set_id(0);
        Ok(record)
    }

    /// The record with the fields of `body` applied; the id never changes
    fn merged(&self, body: Value) -> ApiResult<Self> {
        let Value::Object(changes) = body else {
            return Err(ApiError::invalid("Data must be a dictionary."));
        };
        let mut current = serde_json::to_value(self)?;
        if let Value::Object(fields) = &mut current {
            fields.extend(changes.into_iter().filter(|(field, _)| field != "id"));
        }
        let mut record: Self = serde_json::from_value(current).map_err(invalid_data)?;
        record.set_id(self.id());
        Ok(record)
    }
}

impl Resource for Tag {
    fn access() -> &'static AccessTable {
        &access::TAG
    }

    fn records(storage: &dyn Storage) -> &dyn RecordStorage<Self> {
        storage.tags()
    }
}

impl Resource for ProjectorMessage {
    fn access() -> &'static AccessTable {
        &access::PROJECTOR_MESSAGE
    }

    fn records(storage: &dyn Storage) -> &dyn RecordStorage<Self> {
        storage.projector_messages()
    }
}

impl Resource for Countdown {
    fn access() -> &'static AccessTable {
        &access::COUNTDOWN
    }

    fn records(storage: &dyn Storage) -> &dyn RecordStorage<Self> {
        storage.countdowns()
    }
}

impl Resource for ChatMessage {
    fn access() -> &'static AccessTable {
        &access::CHAT_MESSAGE
    }

    fn records(storage: &dyn Storage) -> &dyn RecordStorage<Self> {
        storage.chat_messages()
    }

    /// Author and time are always set by the server
    fn from_payload(body: Value, user: &CurrentUser) -> ApiResult<Self> {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::invalid("message: This field is required."))?;
        Ok(ChatMessage {
            id: 0,
            message: message.to_string(),
            timestamp: Utc::now(),
            user_id: user.id,
        })
    }
}

pub async fn list<R: Resource>(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<R>>> {
    state.authorize(R::access(), "list", &user).await?;
    Ok(Json(R::records(state.storage.as_ref()).list().await?))
}

pub async fn retrieve<R: Resource>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<R>> {
    state.authorize(R::access(), "retrieve", &user).await?;
    R::records(state.storage.as_ref())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Not found."))
}

pub async fn create<R: Resource>(
    State(state): State<AppState>,
    user: CurrentUser,
    Payload(body): Payload,
) -> ApiResult<(StatusCode, Json<R>)> {
    state.authorize(R::access(), "create", &user).await?;
    let record = R::from_payload(body, &user)?;
    let record = R::records(state.storage.as_ref()).insert(record).await?;
    state
        .notifier
        .inform_changed(autoupdate::changed(std::slice::from_ref(&record))?);
    tracing::info!(collection = R::COLLECTION, id = record.id(), "Created record");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn apply_update<R: Resource>(
    state: &AppState,
    action: &str,
    user: &CurrentUser,
    id: RecordId,
    body: Value,
) -> ApiResult<Json<R>> {
    state.authorize(R::access(), action, user).await?;
    let _guard = state.record_locks.lock(&(R::COLLECTION, id)).await;
    let records = R::records(state.storage.as_ref());
    let current = records
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))?;
    let record = current.merged(body)?;
    records.upsert(record.clone()).await?;
    state
        .notifier
        .inform_changed(autoupdate::changed(std::slice::from_ref(&record))?);
    tracing::info!(collection = R::COLLECTION, id, "Updated record");
    Ok(Json(record))
}

/// PUT; fields missing from the body keep their value
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    Payload(body): Payload,
) -> ApiResult<Json<R>> {
    apply_update(&state, "update", &user, id, body).await
}

pub async fn partial_update<R: Resource>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    Payload(body): Payload,
) -> ApiResult<Json<R>> {
    apply_update(&state, "partial_update", &user, id, body).await
}

pub async fn destroy<R: Resource>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    state.authorize(R::access(), "destroy", &user).await?;
    let _guard = state.record_locks.lock(&(R::COLLECTION, id)).await;
    if !R::records(state.storage.as_ref()).delete(id).await? {
        return Err(ApiError::not_found("Not found."));
    }
    state
        .notifier
        .inform_deleted(vec![ElementRef::new(R::COLLECTION, id)]);
    tracing::info!(collection = R::COLLECTION, id, "Deleted record");
    Ok(StatusCode::NO_CONTENT)
}
