mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use lexchat_shared::constants::{ASSISTANT_ACK, FILE_ONLY_PLACEHOLDER};

fn auth_header(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        format!("Bearer {}", token).parse().unwrap(),
    )
}

async fn setup() -> (TestServer, sqlx::SqlitePool) {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool.clone());
    let server = TestServer::new(app).unwrap();
    (server, pool)
}

#[tokio::test]
async fn first_send_creates_session_with_user_and_assistant_pair() {
    let (server, pool) = setup().await;
    let (_user_id, token) =
        common::create_test_user(&pool, "alice@test.com", "alice", "pass12345").await;

    let (h, v) = auth_header(&token);
    let res = server
        .post("/api/sessions/messages")
        .add_header(h, v)
        .json(&json!({"text": "Hello", "files": []}))
        .await;

    res.assert_status_ok();
    let body: Value = res.json();

    assert!(!body["sessionId"].as_str().unwrap().is_empty());
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "Hello");
    assert_eq!(messages[0]["seq"], 1);
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], ASSISTANT_ACK);
    assert_eq!(messages[1]["seq"], 2);
    assert_eq!(body["appendedSeqs"], json!([1, 2]));
}

#[tokio::test]
async fn file_only_send_stores_the_placeholder_content() {
    let (server, pool) = setup().await;
    let (_user_id, token) =
        common::create_test_user(&pool, "alice@test.com", "alice", "pass12345").await;

    let (h, v) = auth_header(&token);
    let res = server
        .post("/api/sessions/messages")
        .add_header(h, v)
        .json(&json!({
            "text": "",
            "files": [{
                "fileName": "a.pdf",
                "fileType": "application/pdf",
                "fileSize": 1024,
                "filePath": "/x"
            }]
        }))
        .await;

    res.assert_status_ok();
    let body: Value = res.json();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages[0]["content"], FILE_ONLY_PLACEHOLDER);

    let files = messages[0]["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["fileName"], "a.pdf");
    assert_eq!(files[0]["filePath"], "/x");

    // The assistant reply carries no files at all.
    assert!(messages[1].get("files").is_none());
}

#[tokio::test]
async fn blank_send_is_rejected_with_400() {
    let (server, pool) = setup().await;
    let (_user_id, token) =
        common::create_test_user(&pool, "alice@test.com", "alice", "pass12345").await;

    let (h, v) = auth_header(&token);
    let res = server
        .post("/api/sessions/messages")
        .add_header(h, v)
        .json(&json!({"text": "   ", "files": []}))
        .await;

    res.assert_status(StatusCode::BAD_REQUEST);

    // Nothing was persisted.
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chat_sessions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn unknown_session_id_is_404() {
    let (server, pool) = setup().await;
    let (_user_id, token) =
        common::create_test_user(&pool, "alice@test.com", "alice", "pass12345").await;

    let (h, v) = auth_header(&token);
    let res = server
        .post("/api/sessions/messages")
        .add_header(h, v)
        .json(&json!({"text": "Hello", "files": [], "sessionId": "nope"}))
        .await;

    res.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn appends_continue_the_sequence() {
    let (server, pool) = setup().await;
    let (_user_id, token) =
        common::create_test_user(&pool, "alice@test.com", "alice", "pass12345").await;

    let (h, v) = auth_header(&token);
    let res = server
        .post("/api/sessions/messages")
        .add_header(h.clone(), v.clone())
        .json(&json!({"text": "First", "files": []}))
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    let session_id = body["sessionId"].as_str().unwrap().to_string();

    let res = server
        .post("/api/sessions/messages")
        .add_header(h, v)
        .json(&json!({"text": "Second", "files": [], "sessionId": session_id}))
        .await;
    res.assert_status_ok();
    let body: Value = res.json();

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(body["appendedSeqs"], json!([3, 4]));
    // The pair is contiguous and (user, assistant) ordered.
    assert_eq!(messages[2]["role"], "user");
    assert_eq!(messages[3]["role"], "assistant");
}

#[tokio::test]
async fn duplicate_request_id_appends_nothing() {
    let (server, pool) = setup().await;
    let (_user_id, token) =
        common::create_test_user(&pool, "alice@test.com", "alice", "pass12345").await;

    let (h, v) = auth_header(&token);
    let res = server
        .post("/api/sessions/messages")
        .add_header(h.clone(), v.clone())
        .json(&json!({"text": "Hello", "files": [], "requestId": "req-1"}))
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    let session_id = body["sessionId"].as_str().unwrap().to_string();

    // The client retries the same request against the session it now knows.
    let res = server
        .post("/api/sessions/messages")
        .add_header(h, v)
        .json(&json!({
            "text": "Hello",
            "files": [],
            "sessionId": session_id,
            "requestId": "req-1"
        }))
        .await;
    res.assert_status_ok();
    let body: Value = res.json();

    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(body["appendedSeqs"], json!([]));
}

#[tokio::test]
async fn sessions_are_scoped_to_their_owner() {
    let (server, pool) = setup().await;
    let (_alice_id, alice_token) =
        common::create_test_user(&pool, "alice@test.com", "alice", "pass12345").await;
    let (_bob_id, bob_token) =
        common::create_test_user(&pool, "bob@test.com", "bob", "pass12345").await;

    let (h, v) = auth_header(&alice_token);
    let res = server
        .post("/api/sessions/messages")
        .add_header(h, v)
        .json(&json!({"text": "Private", "files": []}))
        .await;
    let body: Value = res.json();
    let session_id = body["sessionId"].as_str().unwrap().to_string();

    // Bob cannot append to Alice's session...
    let (h, v) = auth_header(&bob_token);
    let res = server
        .post("/api/sessions/messages")
        .add_header(h.clone(), v.clone())
        .json(&json!({"text": "Hi", "files": [], "sessionId": session_id}))
        .await;
    res.assert_status(StatusCode::NOT_FOUND);

    // ...nor read it.
    let res = server
        .get(&format!("/api/sessions/{}", session_id))
        .add_header(h, v)
        .await;
    res.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_session_returns_the_full_message_list() {
    let (server, pool) = setup().await;
    let (_user_id, token) =
        common::create_test_user(&pool, "alice@test.com", "alice", "pass12345").await;

    let (h, v) = auth_header(&token);
    let res = server
        .post("/api/sessions/messages")
        .add_header(h.clone(), v.clone())
        .json(&json!({"text": "Hello", "files": []}))
        .await;
    let body: Value = res.json();
    let session_id = body["sessionId"].as_str().unwrap().to_string();

    let res = server
        .get(&format!("/api/sessions/{}", session_id))
        .add_header(h, v)
        .await;
    res.assert_status_ok();
    let body: Value = res.json();

    assert_eq!(body["id"], session_id);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["seq"], 1);
    assert_eq!(messages[1]["seq"], 2);
}

#[tokio::test]
async fn get_unknown_session_is_404() {
    let (server, pool) = setup().await;
    let (_user_id, token) =
        common::create_test_user(&pool, "alice@test.com", "alice", "pass12345").await;

    let (h, v) = auth_header(&token);
    let res = server
        .get("/api/sessions/does-not-exist")
        .add_header(h, v)
        .await;
    res.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_list_is_most_recent_first() {
    let (server, pool) = setup().await;
    let (_user_id, token) =
        common::create_test_user(&pool, "alice@test.com", "alice", "pass12345").await;

    let (h, v) = auth_header(&token);
    let res = server
        .post("/api/sessions/messages")
        .add_header(h.clone(), v.clone())
        .json(&json!({"text": "First chat", "files": []}))
        .await;
    let first: Value = res.json();
    let first_id = first["sessionId"].as_str().unwrap().to_string();

    let res = server
        .post("/api/sessions/messages")
        .add_header(h.clone(), v.clone())
        .json(&json!({"text": "Second chat", "files": []}))
        .await;
    let second: Value = res.json();
    let second_id = second["sessionId"].as_str().unwrap().to_string();

    // Touch the first session again so it becomes the most recent.
    sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
        .bind((chrono::Utc::now() + chrono::Duration::seconds(10)).to_rfc3339())
        .bind(&first_id)
        .execute(&pool)
        .await
        .unwrap();

    let res = server.get("/api/sessions").add_header(h, v).await;
    res.assert_status_ok();
    let body: Value = res.json();
    let sessions = body.as_array().unwrap();

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["id"], first_id);
    assert_eq!(sessions[1]["id"], second_id);
    assert_eq!(sessions[0]["messageCount"], 2);
}

#[tokio::test]
async fn sending_without_auth_is_401() {
    let (server, _pool) = setup().await;

    let res = server
        .post("/api/sessions/messages")
        .json(&json!({"text": "Hello", "files": []}))
        .await;
    res.assert_status(StatusCode::UNAUTHORIZED);
}
