//! Autoupdate stream

use crate::access;
use crate::api::rest::state::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, Stream};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Change notifications as server-sent events
pub async fn stream_autoupdate(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    state.authorize(&access::AUTOUPDATE, "stream", &user).await?;
    let rx = state.notifier.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(message) => {
                let json = serde_json::to_string(&message).unwrap_or_default();
                Some((Ok(Event::default().event("autoupdate").data(json)), rx))
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Autoupdate subscriber lagged");
                Some((Ok(Event::default().comment("lagged")), rx))
            }
            Err(RecvError::Closed) => None,
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    ))
}
