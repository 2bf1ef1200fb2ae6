use crate::helpers::{assert_error_envelope, spawn_app};

#[tokio::test]
async fn unknown_routes_return_404_with_the_requested_url() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app.get("/api/v1/unknown").await;

    // assert
    let message = assert_error_envelope(response, 404).await;
    assert_eq!(message, "Can't find /api/v1/unknown on this server!");
}

#[tokio::test]
async fn the_message_embeds_the_query_string_as_sent() {
    let app = spawn_app().await;

    // the repeated key is collapsed by the pollution guard before routing
    let response = app.get("/no/such/page?page=1&page=2").await;

    let message = assert_error_envelope(response, 404).await;
    assert_eq!(
        message,
        "Can't find /no/such/page?page=1&page=2 on this server!"
    );
}

#[tokio::test]
async fn every_method_falls_through_to_the_catch_all() {
    let app = spawn_app().await;

    let response = app
        .post_json("/api/v2/forms", &serde_json::json!({"name": "x"}))
        .await;
    let message = assert_error_envelope(response, 404).await;
    assert_eq!(message, "Can't find /api/v2/forms on this server!");

    let response = app
        .api_client
        .delete(app.url("/api/v1"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_error_envelope(response, 404).await;
}
