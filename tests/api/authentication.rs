use crate::helpers::{access_token, assert_error_envelope, spawn_app};
use serde_json::json;

#[tokio::test]
async fn protected_routes_reject_requests_without_a_token() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app.get("/api/v1/user/profile").await;

    // assert
    let message = assert_error_envelope(response, 401).await;
    assert_eq!(message, "You are not logged in! Please log in to get access.");
}

#[tokio::test]
async fn invalid_or_expired_tokens_are_forbidden() {
    let app = spawn_app().await;
    let test_cases = vec![
        ("not-a-jwt".to_string(), "a malformed token"),
        (access_token("user-1", -3600), "an expired token"),
    ];

    for (token, description) in test_cases {
        let response = app
            .api_client
            .get(app.url("/api/v1/user/profile"))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            403,
            response.status().as_u16(),
            "The API did not fail with 403 for {}",
            description
        );
        let message = assert_error_envelope(response, 403).await;
        assert_eq!(message, "Invalid or expired token. Please log in again.");
    }
}

#[tokio::test]
async fn a_valid_bearer_token_reaches_the_handler() {
    let app = spawn_app().await;
    let user_id = uuid::Uuid::new_v4().to_string();

    let response = app
        .api_client
        .get(app.url("/api/v1/user/profile"))
        .bearer_auth(access_token(&user_id, 600))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 200);
    let identity: serde_json::Value = response.json().await.unwrap();
    assert_eq!(identity, json!({"user_id": user_id, "roles": ["user"]}));
}

#[tokio::test]
async fn the_access_token_cookie_is_accepted() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(app.url("/api/v1/user/profile"))
        .header(
            "Cookie",
            format!("theme=dark; jwt={}", access_token("user-7", 600)),
        )
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 200);
    let identity: serde_json::Value = response.json().await.unwrap();
    assert_eq!(identity["user_id"], "user-7");
}

#[tokio::test]
async fn unknown_paths_under_the_protected_group_need_a_token_first() {
    let app = spawn_app().await;

    let response = app.get("/api/v1/user/missing").await;
    assert_error_envelope(response, 401).await;

    let response = app
        .api_client
        .get(app.url("/api/v1/user/missing"))
        .bearer_auth(access_token("user-1", 600))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_error_envelope(response, 404).await;
}

#[tokio::test]
async fn open_groups_do_not_require_a_token() {
    let app = spawn_app().await;

    let response = app.get("/api/v1/auth/session").await;
    assert_eq!(response.status().as_u16(), 200);
    let session: serde_json::Value = response.json().await.unwrap();
    assert_eq!(session, json!({"authenticated": false, "user_id": null}));

    let response = app
        .post_json("/api/v1/forms", &json!({"name": "anonymous"}))
        .await;
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn the_session_endpoint_reports_a_valid_token() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(app.url("/api/v1/auth/session"))
        .bearer_auth(access_token("user-9", 600))
        .send()
        .await
        .expect("Failed to execute request.");

    let session: serde_json::Value = response.json().await.unwrap();
    assert_eq!(session, json!({"authenticated": true, "user_id": "user-9"}));
}

#[tokio::test]
async fn unsupported_methods_on_protected_routes_reach_the_catch_all() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .delete(app.url("/api/v1/user/profile"))
        .bearer_auth(access_token("user-1", 600))
        .send()
        .await
        .expect("Failed to execute request.");

    let message = assert_error_envelope(response, 404).await;
    assert_eq!(message, "Can't find /api/v1/user/profile on this server!");
}
