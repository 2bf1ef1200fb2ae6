use crate::helpers::{assert_error_envelope, spawn_app};

#[tokio::test]
async fn json_bodies_over_10kb_are_rejected_before_any_handler() {
    // arrange
    let app = spawn_app().await;
    let body = serde_json::json!({ "comment": "a".repeat(11 * 1024) });

    // act
    let response = app.post_json("/api/v1/forms", &body).await;

    // assert
    let message = assert_error_envelope(response, 413).await;
    assert!(message.contains("10240"));
}

#[tokio::test]
async fn json_bodies_under_the_limit_reach_the_handler() {
    let app = spawn_app().await;
    let body = serde_json::json!({ "comment": "a".repeat(9 * 1024) });

    let response = app.post_json("/api/v1/forms", &body).await;

    assert_eq!(response.status().as_u16(), 201);
    let received: serde_json::Value = response.json().await.unwrap();
    assert_eq!(received["status"], "received");
    assert_eq!(received["data"], body);
}

#[tokio::test]
async fn malformed_json_is_a_400() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(app.url("/api/v1/forms"))
        .header("Content-Type", "application/json")
        .body(r#"{"name": "unterminated"#)
        .send()
        .await
        .expect("Failed to execute request.");

    let message = assert_error_envelope(response, 400).await;
    assert_eq!(message, "Request body is not valid JSON.");
}

#[tokio::test]
async fn form_submissions_must_be_json_objects() {
    let app = spawn_app().await;
    let test_cases = vec![
        (serde_json::json!([1, 2, 3]), "an array"),
        (serde_json::json!("text"), "a string"),
    ];

    for (body, description) in test_cases {
        let response = app.post_json("/api/v1/forms", &body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 when the payload was {}",
            description
        );
    }
}

#[tokio::test]
async fn the_body_limit_follows_configuration() {
    let app = crate::helpers::spawn_app_with(|settings| {
        settings.security.body_limit_bytes = 64;
    })
    .await;
    let body = serde_json::json!({ "comment": "a".repeat(100) });

    let response = app.post_json("/api/v1/forms", &body).await;

    assert_error_envelope(response, 413).await;
}

fn json_body_of_exactly(length: usize) -> String {
    // `{"comment":""}` is 14 bytes
    format!(r#"{{"comment":"{}"}}"#, "a".repeat(length - 14))
}

#[tokio::test]
async fn the_body_limit_is_inclusive() {
    let app = spawn_app().await;
    let test_cases = vec![(10 * 1024, 201), (10 * 1024 + 1, 413)];

    for (length, expected_status) in test_cases {
        let body = json_body_of_exactly(length);
        assert_eq!(body.len(), length);

        let response = app
            .api_client
            .post(app.url("/api/v1/forms"))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            expected_status,
            response.status().as_u16(),
            "Unexpected status for a {} byte body",
            length
        );
    }
}
