use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use argon2::{PasswordHasher, PasswordVerifier};
use lexchat_shared::validation::validate_password;

use crate::middleware::auth::{extract_token, SESSION_COOKIE};
use crate::models::{SessionResponse, SessionUser, SignInRequest, SignUpRequest};
use crate::AppState;

const SESSION_TTL_DAYS: i64 = 30;

async fn create_session(db: &sqlx::SqlitePool, user_id: &str) -> Result<String, sqlx::Error> {
    let token = uuid::Uuid::new_v4().to_string();
    let session_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let expires_at = (chrono::Utc::now() + chrono::Duration::days(SESSION_TTL_DAYS)).to_rfc3339();

    sqlx::query(
        r#"INSERT INTO "session" (id, user_id, token, expires_at, created_at) VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(&session_id)
    .bind(user_id)
    .bind(&token)
    .bind(&expires_at)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(token)
}

fn session_cookie_headers(token: &str) -> HeaderMap {
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=None; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        SESSION_TTL_DAYS * 86_400
    );
    let mut headers = HeaderMap::new();
    headers.insert("set-cookie", cookie.parse().unwrap());
    headers
}

/// POST /api/auth/sign-up
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignUpRequest>,
) -> impl IntoResponse {
    let email = body.email.trim().to_lowercase();
    let username = body.username.trim().to_string();

    if email.is_empty() || !email.contains('@') {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "A valid email is required"})),
        )
            .into_response();
    }
    if username.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Username is required"})),
        )
            .into_response();
    }
    if let Err(message) = validate_password(&body.password) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": message})),
        )
            .into_response();
    }

    let exists = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM "user" WHERE email = ?"#)
        .bind(&email)
        .fetch_one(&state.db)
        .await
        .unwrap_or(0);

    if exists > 0 {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "Email already registered"})),
        )
            .into_response();
    }

    let salt = argon2::password_hash::SaltString::generate(&mut rand::rngs::OsRng);
    let password_hash = match argon2::Argon2::default().hash_password(body.password.as_bytes(), &salt)
    {
        Ok(h) => h.to_string(),
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to hash password"})),
            )
                .into_response()
        }
    };

    let user_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"INSERT INTO "user" (id, email, username, password_hash, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&user_id)
    .bind(&email)
    .bind(&username)
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await;

    if result.is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to create user"})),
        )
            .into_response();
    }

    let token = match create_session(&state.db, &user_id).await {
        Ok(t) => t,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to create session"})),
            )
                .into_response()
        }
    };

    let headers = session_cookie_headers(&token);
    let body = SessionResponse {
        user: SessionUser {
            id: user_id,
            email,
            username,
        },
        token,
    };

    (StatusCode::OK, headers, Json(body)).into_response()
}

/// POST /api/auth/sign-in
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignInRequest>,
) -> impl IntoResponse {
    let email = body.email.trim().to_lowercase();

    let row = sqlx::query_as::<_, (String, String, String, String)>(
        r#"SELECT id, email, username, password_hash FROM "user" WHERE email = ?"#,
    )
    .bind(&email)
    .fetch_optional(&state.db)
    .await
    .ok()
    .flatten();

    let (user_id, user_email, username, stored_hash) = match row {
        Some(r) => r,
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "Invalid credentials"})),
            )
                .into_response()
        }
    };

    let parsed_hash = match argon2::PasswordHash::new(&stored_hash) {
        Ok(h) => h,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Internal error"})),
            )
                .into_response()
        }
    };

    if argon2::Argon2::default()
        .verify_password(body.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Invalid credentials"})),
        )
            .into_response();
    }

    let token = match create_session(&state.db, &user_id).await {
        Ok(t) => t,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to create session"})),
            )
                .into_response()
        }
    };

    let headers = session_cookie_headers(&token);
    let body = SessionResponse {
        user: SessionUser {
            id: user_id,
            email: user_email,
            username,
        },
        token,
    };

    (StatusCode::OK, headers, Json(body)).into_response()
}

/// POST /api/auth/sign-out
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(token) = extract_token(&headers) {
        let _ = sqlx::query(r#"DELETE FROM "session" WHERE token = ?"#)
            .bind(&token)
            .execute(&state.db)
            .await;
    }

    let cookie = format!("{}=; HttpOnly; SameSite=None; Path=/; Max-Age=0", SESSION_COOKIE);
    let mut resp_headers = HeaderMap::new();
    resp_headers.insert("set-cookie", cookie.parse().unwrap());

    (StatusCode::OK, resp_headers, Json(serde_json::json!({}))).into_response()
}
