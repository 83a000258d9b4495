//! Request extractors

use super::state::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use lectern_types::RecordId;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Header carrying the id of the calling user
pub const USER_HEADER: &str = "x-user-id";

/// Requests without [`USER_HEADER`] are anonymous
#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(USER_HEADER) else {
            return Ok(CurrentUser::anonymous());
        };
        let unknown = || ApiError::Unauthenticated("Invalid user.".to_string());
        let id = raw
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<RecordId>().ok())
            .ok_or_else(unknown)?;
        state.permissions.user(id).ok_or_else(unknown)
    }
}

/// Any JSON body; malformed JSON is reported like every other input error
#[derive(Debug, Clone)]
pub struct Payload(pub Value);

#[axum::async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::invalid(rejection.body_text())),
        }
    }
}

/// Path parameters; a malformed segment is reported like every other input error
#[derive(Debug, Clone)]
pub struct Path<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::invalid(rejection.body_text())),
        }
    }
}
