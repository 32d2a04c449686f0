use axum::Router;
use lexchat_server::{
    config::{Config, SummarizerProvider},
    ingest, routes, AppState,
};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

use argon2::PasswordHasher;

/// Create an in-memory SQLite pool with schema applied.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();

    // Run schema
    let schema = include_str!("../../src/db/schema.sql");
    for statement in schema.split(';') {
        let trimmed = statement.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(&pool).await.unwrap();
        }
    }

    pool
}

/// Config pointing at throwaway locations; the analysis service URL is only
/// reached by tests that mock it.
pub fn test_config(upload_dir: &str, analysis_service_url: &str) -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        database_path: ":memory:".into(),
        upload_dir: upload_dir.into(),
        max_upload_bytes: 10_485_760,
        summarizer_provider: SummarizerProvider::AnalysisService,
        generative_api_url: "http://127.0.0.1:1".into(),
        generative_api_key: "test-key".into(),
        generative_model: "test-model".into(),
        analysis_service_url: analysis_service_url.into(),
        summary_input_char_budget: 24_000,
    }
}

/// Build a test Axum app with the given pool and config.
pub fn create_test_app_with_config(pool: SqlitePool, config: Config) -> Router {
    let pipeline = ingest::IngestionPipeline::new(
        ingest::build_summarizer(&config),
        config.summary_input_char_budget,
    );
    let state = Arc::new(AppState {
        db: pool,
        config,
        pipeline,
    });
    routes::build_router(state)
}

/// Build a test Axum app with default test config.
pub fn create_test_app(pool: SqlitePool) -> Router {
    create_test_app_with_config(
        pool,
        test_config("/tmp/lexchat-test-uploads", "http://127.0.0.1:1"),
    )
}

/// Create a test user directly in the database. Returns (user_id, session_token).
pub async fn create_test_user(
    pool: &SqlitePool,
    email: &str,
    username: &str,
    password: &str,
) -> (String, String) {
    let user_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let salt = argon2::password_hash::SaltString::generate(&mut rand::rngs::OsRng);
    let password_hash = argon2::Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string();

    sqlx::query(
        r#"INSERT INTO "user" (id, email, username, password_hash, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&user_id)
    .bind(email)
    .bind(username)
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    let session_token = uuid::Uuid::new_v4().to_string();
    let session_id = uuid::Uuid::new_v4().to_string();
    let expires_at = (chrono::Utc::now() + chrono::Duration::days(30)).to_rfc3339();

    sqlx::query(
        r#"INSERT INTO "session" (id, user_id, token, expires_at, created_at)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(&session_id)
    .bind(&user_id)
    .bind(&session_token)
    .bind(&expires_at)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    (user_id, session_token)
}

/// Create a file asset row directly (no blob on disk).
pub async fn create_test_asset(
    pool: &SqlitePool,
    owner_id: &str,
    original_name: &str,
    file_type: &str,
    uploaded_at: &str,
) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    let stored = format!("file-{}.bin", &id[..8]);
    sqlx::query(
        r#"INSERT INTO file_assets (id, owner_id, file_name, original_name, file_type, file_size, file_path, uploaded_at)
           VALUES (?, ?, ?, ?, ?, 1024, ?, ?)"#,
    )
    .bind(&id)
    .bind(owner_id)
    .bind(&stored)
    .bind(original_name)
    .bind(file_type)
    .bind(format!("/tmp/lexchat-test-uploads/{}", stored))
    .bind(uploaded_at)
    .execute(pool)
    .await
    .unwrap();
    id
}
