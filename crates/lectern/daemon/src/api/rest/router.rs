//! API Router configuration

use super::handlers::{
    autoupdate, chat, config, history, projectors, resources, system,
};
use super::state::AppState;
use crate::config::ServerConfig;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use lectern_types::{ChatMessage, Countdown, ProjectorMessage, Tag};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Viewset routes for a collection served by the generic handlers
fn crud<R: resources::Resource>(router: Router<AppState>, base: &str) -> Router<AppState> {
    router
        .route(
            &format!("{}/", base),
            get(resources::list::<R>).post(resources::create::<R>),
        )
        .route(
            &format!("{}/:id/", base),
            get(resources::retrieve::<R>)
                .put(resources::update::<R>)
                .patch(resources::partial_update::<R>)
                .delete(resources::destroy::<R>),
        )
}

/// Create the main API router
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let rest_routes = Router::new()
        // Projectors
        .route(
            "/projector/",
            get(projectors::list_projectors).post(projectors::create_projector),
        )
        .route("/projector/project/", post(projectors::project))
        .route(
            "/projector/:id/",
            get(projectors::get_projector)
                .put(projectors::update_projector)
                .patch(projectors::partial_update_projector)
                .delete(projectors::delete_projector),
        )
        .route(
            "/projector/:id/activate_elements/",
            post(projectors::activate_elements),
        )
        .route(
            "/projector/:id/prune_elements/",
            post(projectors::prune_elements),
        )
        .route(
            "/projector/:id/update_elements/",
            post(projectors::update_elements),
        )
        .route(
            "/projector/:id/deactivate_elements/",
            post(projectors::deactivate_elements),
        )
        .route(
            "/projector/:id/clear_elements/",
            post(projectors::clear_elements),
        )
        .route(
            "/projector/:id/set_resolution/",
            post(projectors::set_resolution),
        )
        .route("/projector/:id/control_view/", post(projectors::control_view))
        .route("/projector/:id/set_scroll/", post(projectors::set_scroll))
        .route(
            "/projector/:id/control_blank/",
            post(projectors::control_blank),
        )
        .route("/projector/:id/broadcast/", post(projectors::broadcast))
        .route(
            "/projector/:id/set_projectiondefault/",
            post(projectors::set_projection_default),
        )
        // Projection defaults
        .route(
            "/projection-default/",
            get(projectors::list_projection_defaults),
        )
        .route(
            "/projection-default/:id/",
            get(projectors::get_projection_default),
        )
        // Config
        .route("/config/", get(config::list_config))
        .route(
            "/config/:key/",
            get(config::get_config)
                .put(config::update_config)
                .patch(config::partial_update_config),
        )
        // Chat
        .route(
            "/chat-message/",
            get(resources::list::<ChatMessage>).post(resources::create::<ChatMessage>),
        )
        .route("/chat-message/clear/", post(chat::clear_chat))
        .route(
            "/chat-message/:id/",
            get(resources::retrieve::<ChatMessage>),
        )
        // History
        .route("/history/", get(history::list_history))
        .route("/history/clear_history/", post(history::clear_history))
        .route("/history/:id/", get(history::get_history));

    let rest_routes = crud::<Tag>(rest_routes, "/tag");
    let rest_routes = crud::<ProjectorMessage>(rest_routes, "/projector-message");
    let rest_routes = crud::<Countdown>(rest_routes, "/countdown");

    let app_routes = Router::new()
        .route("/servertime/", get(system::servertime))
        .route("/version/", get(system::version))
        .route("/history/", get(history::timeline))
        .route("/autoupdate/", get(autoupdate::stream_autoupdate));

    // Build router with middleware
    let mut router = Router::new()
        .nest("/rest/core", rest_routes)
        .nest("/apps/core", app_routes)
        .layer(DefaultBodyLimit::max(server.max_body_size))
        .layer(TraceLayer::new_for_http());

    if server.enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}
