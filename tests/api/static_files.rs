use crate::helpers::{assert_error_envelope, spawn_app};

#[tokio::test]
async fn files_in_the_public_directory_are_served() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app.get("/robots.txt").await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Disallow: /api/"));
}

#[tokio::test]
async fn the_root_serves_the_index_page() {
    let app = spawn_app().await;

    let response = app.get("/").await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap()
        .starts_with("text/html"));
}

#[tokio::test]
async fn only_reads_are_served_from_disk() {
    let app = spawn_app().await;

    let response = app
        .post_json("/robots.txt", &serde_json::json!({"a": 1}))
        .await;

    let message = assert_error_envelope(response, 404).await;
    assert_eq!(message, "Can't find /robots.txt on this server!");
}

#[tokio::test]
async fn hidden_and_missing_files_fall_through_to_the_catch_all() {
    let app = spawn_app().await;

    for path in ["/.gitignore", "/missing.css"] {
        let response = app.get(path).await;
        assert_error_envelope(response, 404).await;
    }
}

#[tokio::test]
async fn static_hits_skip_body_parsing() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(app.url("/robots.txt"))
        .header("Content-Type", "application/json")
        .body("{ this is not json")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 200);
}
