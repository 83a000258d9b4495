//! Router-level tests of the REST API

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use lectern_daemon::config::{AuthConfig, DaemonConfig, UserConfig};
use lectern_daemon::{create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN: Option<i64> = Some(1);
const STAFF: Option<i64> = Some(2);
const DELEGATE: Option<i64> = Some(3);
const ANONYMOUS: Option<i64> = None;

async fn app() -> Router {
    let mut config = DaemonConfig::default();
    config.auth = AuthConfig {
        users: vec![
            UserConfig {
                id: 1,
                username: "admin".to_string(),
                groups: vec![2],
            },
            UserConfig {
                id: 2,
                username: "staff".to_string(),
                groups: vec![3],
            },
            UserConfig {
                id: 3,
                username: "delegate".to_string(),
                groups: vec![4],
            },
        ],
        ..AuthConfig::default()
    };
    let state = AppState::bootstrap(&config).await.unwrap();
    create_router(state, &config.server)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header("x-user-id", user.to_string());
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn unstable_count(projector: &Value) -> usize {
    projector["elements"]
        .as_object()
        .unwrap()
        .values()
        .filter(|el| el["stable"] != json!(true))
        .count()
}

#[tokio::test]
async fn test_default_projector_is_seeded() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/rest/core/projector/1/", ADMIN, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Default projector");
    let elements = body["elements"].as_object().unwrap();
    assert_eq!(elements.len(), 1);
    let (key, clock) = elements.iter().next().unwrap();
    assert_eq!(key.len(), 32);
    assert_eq!(clock["name"], "core/clock");

    let (status, defaults) =
        send(&app, "GET", "/rest/core/projection-default/", ADMIN, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(defaults.as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn test_anonymous_access_follows_config() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/rest/core/projector/", ANONYMOUS, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "You do not have permission to perform this action.");

    let (status, _) = send(
        &app,
        "PATCH",
        "/rest/core/config/general_system_enable_anonymous/",
        ADMIN,
        Some(json!({"value": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/rest/core/projector/", ANONYMOUS, None).await;
    assert_eq!(status, StatusCode::OK);

    // Anonymous users never chat
    let (status, _) = send(
        &app,
        "POST",
        "/rest/core/chat-message/",
        ANONYMOUS,
        Some(json!({"message": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_user_is_rejected() {
    let app = app().await;
    let (status, _) = send(&app, "GET", "/rest/core/tag/", Some(99), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_element_lifecycle() {
    let app = app().await;
    let (status, projector) = send(
        &app,
        "POST",
        "/rest/core/projector/1/activate_elements/",
        STAFF,
        Some(json!([{"name": "motions/motion", "id": 4}])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(projector["elements"].as_object().unwrap().len(), 2);

    let key = projector["elements"]
        .as_object()
        .unwrap()
        .iter()
        .find(|(_, el)| el["name"] == "motions/motion")
        .map(|(key, _)| key.clone())
        .unwrap();

    let (status, projector) = send(
        &app,
        "POST",
        "/rest/core/projector/1/update_elements/",
        STAFF,
        Some(json!({ key.clone(): {"id": 5, "mode": "diff"} })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(projector["elements"][&key]["id"], 5);
    assert_eq!(projector["elements"][&key]["name"], "motions/motion");

    let (status, body) = send(
        &app,
        "POST",
        "/rest/core/projector/1/deactivate_elements/",
        STAFF,
        Some(json!([key.clone(), "191c0878cdc04abfbd64f3177a21891a"])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid UUID.");

    let (_, projector) = send(&app, "GET", "/rest/core/projector/1/", STAFF, None).await;
    assert_eq!(unstable_count(&projector), 1);

    let (status, projector) = send(
        &app,
        "POST",
        "/rest/core/projector/1/clear_elements/",
        STAFF,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unstable_count(&projector), 0);
    assert_eq!(projector["elements"].as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_project_moves_element_between_projectors() {
    let app = app().await;
    send(
        &app,
        "POST",
        "/rest/core/projector/1/activate_elements/",
        ADMIN,
        Some(json!([{"name": "topics/topic", "id": 1}])),
    )
    .await;
    let (status, side) = send(
        &app,
        "POST",
        "/rest/core/projector/",
        ADMIN,
        Some(json!({"name": "Side"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let side_id = side["id"].as_i64().unwrap();

    // Missing target: nothing is cleared
    let (status, body) = send(
        &app,
        "POST",
        "/rest/core/projector/project/",
        ADMIN,
        Some(json!({"clear_ids": [1], "prune": {"id": 42, "element": {"name": "topics/topic"}}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "The projector with id \"42\" does not exist");
    let (_, main) = send(&app, "GET", "/rest/core/projector/1/", ADMIN, None).await;
    assert_eq!(unstable_count(&main), 1);

    let (status, body) = send(
        &app,
        "POST",
        "/rest/core/projector/project/",
        ADMIN,
        Some(json!({"clear_ids": [1], "prune": {"id": side_id, "element": {"name": "topics/topic", "id": 1}}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let (_, main) = send(&app, "GET", "/rest/core/projector/1/", ADMIN, None).await;
    assert_eq!(unstable_count(&main), 0);
    let (_, side) = send(
        &app,
        "GET",
        &format!("/rest/core/projector/{}/", side_id),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(unstable_count(&side), 1);
}

#[tokio::test]
async fn test_projector_actions_need_manage_permission() {
    let app = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/rest/core/projector/project/",
        DELEGATE,
        Some(json!("not even a dict")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PERMISSION_DENIED");

    let (status, _) = send(&app, "GET", "/rest/core/projector/1/", DELEGATE, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_view_settings() {
    let app = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/rest/core/projector/1/set_resolution/",
        STAFF,
        Some(json!({"width": 500, "height": 768})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "The Resolution have to be between 800x340 and 3840x2880."
    );

    let (status, body) = send(
        &app,
        "POST",
        "/rest/core/projector/1/control_view/",
        STAFF,
        Some(json!({"action": "scroll", "direction": "down"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Scroll down was successful.");

    let (_, body) = send(
        &app,
        "POST",
        "/rest/core/projector/1/control_blank/",
        STAFF,
        Some(json!(true)),
    )
    .await;
    assert_eq!(body["detail"], "Setting 'blank' to True was successful.");

    let (_, projector) = send(&app, "GET", "/rest/core/projector/1/", STAFF, None).await;
    assert_eq!(projector["width"], 1220);
    assert_eq!(projector["scroll"], -1);
    assert_eq!(projector["blank"], true);

    let (status, body) = send(
        &app,
        "POST",
        "/rest/core/projector/1/set_projectiondefault/",
        STAFF,
        Some(json!(5)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!("Setting projectiondefault \"Motions\" to projector 1 was successful.")
    );
}

#[tokio::test]
async fn test_config_update() {
    let app = app().await;
    let (status, body) = send(
        &app,
        "PUT",
        "/rest/core/config/general_event_name/",
        STAFF,
        Some(json!({"value": "Spring assembly"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"key": "general_event_name", "value": "Spring assembly"}));

    let (status, body) = send(
        &app,
        "PATCH",
        "/rest/core/config/general_event_name/",
        STAFF,
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid input. Config value is missing.");

    let (status, _) = send(
        &app,
        "PATCH",
        "/rest/core/config/no_such_key/",
        STAFF,
        Some(json!({"value": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PATCH",
        "/rest/core/config/projector_default_countdown/",
        STAFF,
        Some(json!({"value": "sixty"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PATCH",
        "/rest/core/config/logo_projector_main/",
        DELEGATE,
        Some(json!({"value": {"display_name": "Logo", "path": "/media/logo.png"}})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_tag_crud() {
    let app = app().await;
    let (status, tag) = send(
        &app,
        "POST",
        "/rest/core/tag/",
        STAFF,
        Some(json!({"name": "Budget"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/rest/core/tag/{}/", tag["id"]);

    let (status, tag) = send(&app, "PATCH", &uri, STAFF, Some(json!({"name": "Finance"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tag["name"], "Finance");

    let (status, _) = send(&app, "PATCH", &uri, DELEGATE, Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &uri, STAFF, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &uri, STAFF, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_create_and_clear() {
    let app = app().await;
    let (status, message) = send(
        &app,
        "POST",
        "/rest/core/chat-message/",
        DELEGATE,
        Some(json!({"message": "Point of order", "user_id": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["user_id"], 3);

    let (status, _) = send(&app, "POST", "/rest/core/chat-message/clear/", DELEGATE, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "POST", "/rest/core/chat-message/clear/", STAFF, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "All chat messages deleted successfully.");

    let (_, messages) = send(&app, "GET", "/rest/core/chat-message/", STAFF, None).await;
    assert_eq!(messages, json!([]));
}

#[tokio::test]
async fn test_history_is_admin_only() {
    let app = app().await;
    let (status, _) = send(&app, "GET", "/apps/core/history/", STAFF, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, timeline) = send(&app, "GET", "/apps/core/history/", ADMIN, None).await;
    assert_eq!(status, StatusCode::OK);
    let count = timeline.as_array().unwrap().len();
    assert!(count > 0);
    assert_eq!(timeline[0]["element_id"], "core/projector:1");

    let (status, body) = send(&app, "GET", "/apps/core/history/?timestamp=abc", ADMIN, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid input. Timestamp  should be an integer.");

    let (status, body) = send(&app, "POST", "/rest/core/history/clear_history/", ADMIN, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "History was deleted successfully.");
    let (_, entries) = send(&app, "GET", "/rest/core/history/", ADMIN, None).await;
    assert_eq!(entries.as_array().unwrap().len(), count);
}

#[tokio::test]
async fn test_system_views() {
    let app = app().await;
    let (status, time) = send(&app, "GET", "/apps/core/servertime/", ANONYMOUS, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(time.as_f64().unwrap() > 1_600_000_000.0);

    let (status, version) = send(&app, "GET", "/apps/core/version/", ANONYMOUS, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(version["openslides_license"], "MIT");
    assert_eq!(version["plugins"], json!([]));
}

#[tokio::test]
async fn test_destroy_reassigns_projection_defaults() {
    let app = app().await;
    let (_, side) = send(
        &app,
        "POST",
        "/rest/core/projector/",
        ADMIN,
        Some(json!({"name": "Side"})),
    )
    .await;
    let side_id = side["id"].as_i64().unwrap();
    let uri = format!("/rest/core/projector/{}/", side_id);

    send(
        &app,
        "POST",
        &format!("/rest/core/projector/{}/set_projectiondefault/", side_id),
        ADMIN,
        Some(json!(2)),
    )
    .await;
    let (_, body) = send(
        &app,
        "POST",
        &format!("/rest/core/projector/{}/broadcast/", side_id),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(
        body["detail"],
        format!("Setting projector {} as broadcast projector was successful.", side_id)
    );

    let (status, _) = send(&app, "DELETE", &uri, ADMIN, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, default) = send(&app, "GET", "/rest/core/projection-default/2/", ADMIN, None).await;
    assert_eq!(default["projector_id"], 1);
    let (_, broadcast) = send(
        &app,
        "GET",
        "/rest/core/config/projector_broadcast/",
        ADMIN,
        None,
    )
    .await;
    assert_eq!(broadcast["value"], 0);

    let (status, _) = send(&app, "DELETE", "/rest/core/projector/1/", ADMIN, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_path_id_is_a_json_error() {
    let app = app().await;
    for (method, uri) in [
        ("GET", "/rest/core/tag/abc/"),
        ("DELETE", "/rest/core/projector/first/"),
        ("POST", "/rest/core/projector/1.5/clear_elements/"),
    ] {
        let (status, body) = send(&app, method, uri, ADMIN, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
        assert_eq!(body["code"], "INVALID_INPUT");
        assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));
    }
}
