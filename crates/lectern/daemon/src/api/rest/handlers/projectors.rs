//! Projector and projection default handlers

use super::DetailResponse;
use crate::access;
use crate::api::rest::extract::{Path, Payload};
use crate::api::rest::state::AppState;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::projector::{payload, ProjectorChanges};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use lectern_types::{ProjectionDefault, Projector, RecordId};
use serde_json::Value;

fn changes(body: Value) -> ApiResult<ProjectorChanges> {
    if !body.is_object() {
        return Err(ApiError::invalid("Data must be a dictionary."));
    }
    serde_json::from_value(body).map_err(|err| ApiError::invalid(err.to_string()))
}

pub async fn list_projectors(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Projector>>> {
    state.authorize(&access::PROJECTOR, "list", &user).await?;
    Ok(Json(state.projectors.list().await?))
}

pub async fn get_projector(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Projector>> {
    state.authorize(&access::PROJECTOR, "retrieve", &user).await?;
    Ok(Json(state.projectors.get(id).await?))
}

pub async fn create_projector(
    State(state): State<AppState>,
    user: CurrentUser,
    Payload(body): Payload,
) -> ApiResult<(StatusCode, Json<Projector>)> {
    state.authorize(&access::PROJECTOR, "create", &user).await?;
    let projector = state.projectors.create(changes(body)?).await?;
    Ok((StatusCode::CREATED, Json(projector)))
}

pub async fn update_projector(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    Payload(body): Payload,
) -> ApiResult<Json<Projector>> {
    state.authorize(&access::PROJECTOR, "update", &user).await?;
    Ok(Json(state.projectors.update(id, changes(body)?).await?))
}

pub async fn partial_update_projector(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    Payload(body): Payload,
) -> ApiResult<Json<Projector>> {
    state
        .authorize(&access::PROJECTOR, "partial_update", &user)
        .await?;
    Ok(Json(state.projectors.update(id, changes(body)?).await?))
}

pub async fn delete_projector(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    state.authorize(&access::PROJECTOR, "destroy", &user).await?;
    state.projectors.destroy(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate_elements(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    Payload(body): Payload,
) -> ApiResult<Json<Projector>> {
    state
        .authorize(&access::PROJECTOR, "activate_elements", &user)
        .await?;
    let elements = payload::elements(body)?;
    Ok(Json(state.projectors.activate_elements(id, elements).await?))
}

pub async fn prune_elements(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    Payload(body): Payload,
) -> ApiResult<Json<Projector>> {
    state
        .authorize(&access::PROJECTOR, "prune_elements", &user)
        .await?;
    let elements = payload::elements(body)?;
    Ok(Json(state.projectors.prune_elements(id, elements).await?))
}

pub async fn update_elements(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    Payload(body): Payload,
) -> ApiResult<Json<Projector>> {
    state
        .authorize(&access::PROJECTOR, "update_elements", &user)
        .await?;
    let updates = payload::element_updates(body)?;
    Ok(Json(state.projectors.update_elements(id, updates).await?))
}

pub async fn deactivate_elements(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    Payload(body): Payload,
) -> ApiResult<Json<Projector>> {
    state
        .authorize(&access::PROJECTOR, "deactivate_elements", &user)
        .await?;
    let keys = payload::element_keys(body)?;
    Ok(Json(state.projectors.deactivate_elements(id, keys).await?))
}

pub async fn clear_elements(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Projector>> {
    state
        .authorize(&access::PROJECTOR, "clear_elements", &user)
        .await?;
    Ok(Json(state.projectors.clear_elements(id).await?))
}

pub async fn project(
    State(state): State<AppState>,
    user: CurrentUser,
    Payload(body): Payload,
) -> ApiResult<StatusCode> {
    state.authorize(&access::PROJECTOR, "project", &user).await?;
    let request = payload::project_request(body)?;
    state.projectors.project(request).await?;
    Ok(StatusCode::OK)
}

pub async fn set_resolution(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    Payload(body): Payload,
) -> ApiResult<Json<DetailResponse>> {
    state
        .authorize(&access::PROJECTOR, "set_resolution", &user)
        .await?;
    let resolution = payload::resolution(body)?;
    let detail = state.projectors.set_resolution(id, resolution).await?;
    Ok(Json(DetailResponse::new(detail)))
}

pub async fn control_view(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    Payload(body): Payload,
) -> ApiResult<Json<DetailResponse>> {
    state
        .authorize(&access::PROJECTOR, "control_view", &user)
        .await?;
    let control = payload::view_control(body)?;
    let detail = state.projectors.control_view(id, control).await?;
    Ok(Json(DetailResponse::new(detail)))
}

pub async fn set_scroll(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    Payload(body): Payload,
) -> ApiResult<Json<DetailResponse>> {
    state
        .authorize(&access::PROJECTOR, "set_scroll", &user)
        .await?;
    let scroll = payload::scroll(body)?;
    let detail = state.projectors.set_scroll(id, scroll).await?;
    Ok(Json(DetailResponse::new(detail)))
}

pub async fn control_blank(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    Payload(body): Payload,
) -> ApiResult<Json<DetailResponse>> {
    state
        .authorize(&access::PROJECTOR, "control_blank", &user)
        .await?;
    let blank = payload::blank(body)?;
    let detail = state.projectors.set_blank(id, blank).await?;
    Ok(Json(DetailResponse::new(detail)))
}

pub async fn broadcast(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<DetailResponse>> {
    state
        .authorize(&access::PROJECTOR, "broadcast", &user)
        .await?;
    let detail = state.projectors.broadcast(id).await?;
    Ok(Json(DetailResponse::new(detail)))
}

/// Responds with a bare message string
pub async fn set_projection_default(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    Payload(body): Payload,
) -> ApiResult<Json<String>> {
    state
        .authorize(&access::PROJECTOR, "set_projectiondefault", &user)
        .await?;
    let default_id = payload::projection_default_id(body)?;
    Ok(Json(
        state
            .projectors
            .set_projection_default(id, default_id)
            .await?,
    ))
}

pub async fn list_projection_defaults(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<ProjectionDefault>>> {
    state
        .authorize(&access::PROJECTION_DEFAULT, "list", &user)
        .await?;
    Ok(Json(state.projectors.projection_defaults().await?))
}

pub async fn get_projection_default(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<ProjectionDefault>> {
    state
        .authorize(&access::PROJECTION_DEFAULT, "retrieve", &user)
        .await?;
    Ok(Json(state.projectors.projection_default(id).await?))
}
