use crate::helpers::spawn_app;
use serde_json::json;

#[tokio::test]
async fn operator_and_dotted_keys_never_reach_handlers() {
    // arrange
    let app = spawn_app().await;
    let body = json!({
        "email": {"$gt": ""},
        "name": "Ursula",
        "profile.admin": true,
        "tags": [{"$where": "sleep(1000)", "label": "ok"}]
    });

    // act
    let response = app.post_json("/api/v1/forms/echo", &body).await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let echoed: serde_json::Value = response.json().await.unwrap();
    let expected = json!({
        "email": {},
        "name": "Ursula",
        "tags": [{"label": "ok"}]
    });
    assert_eq!(echoed["extracted"], expected);
    assert_eq!(echoed["context"], expected);
}

#[tokio::test]
async fn clean_bodies_pass_through_untouched() {
    let app = spawn_app().await;
    let body = json!({"name": "Ursula", "address": {"city": "Paris"}});

    let response = app.post_json("/api/v1/forms/echo", &body).await;

    let echoed: serde_json::Value = response.json().await.unwrap();
    assert_eq!(echoed["extracted"], body);
    assert_eq!(echoed["context"], body);
}

#[tokio::test]
async fn prohibited_query_keys_are_dropped() {
    let app = spawn_app().await;

    let response = app
        .get("/api/v1/forms/echo?name=ursula&%24ne=1&user.role=admin&filter%5B%24gt%5D=0")
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let echoed: serde_json::Value = response.json().await.unwrap();
    assert_eq!(echoed["query_string"], "name=ursula");
    assert_eq!(echoed["query"], json!({"name": "ursula"}));
}

#[tokio::test]
async fn sanitized_fields_are_removed_before_the_auth_gate_sees_them() {
    let app = spawn_app().await;
    let token = crate::helpers::access_token("user-42", 600);

    let response = app
        .api_client
        .post(app.url("/api/v1/user/profile"))
        .bearer_auth(token)
        .json(&json!({"$set": {"role": "admin"}, "nickname": "u"}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["update"], json!({"nickname": "u"}));
    assert_eq!(body["user"]["user_id"], "user-42");
}
