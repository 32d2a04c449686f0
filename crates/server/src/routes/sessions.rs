use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;

use lexchat_shared::constants::{ASSISTANT_ACK, FILE_ONLY_PLACEHOLDER, SESSION_LIST_LIMIT};
use lexchat_shared::validation::validate_outgoing_message;

use crate::models::{
    AuthUser, ChatSession, FileReference, Message, MessageWithFiles, SendMessageRequest,
    SessionMessagesResponse, SessionSummary,
};
use crate::AppState;

#[derive(sqlx::FromRow)]
struct MessageFileRow {
    message_id: String,
    file_name: String,
    file_type: String,
    file_size: i64,
    file_path: String,
}

/// Batch-fetch file references for a list of messages.
async fn fetch_file_map(
    db: &sqlx::SqlitePool,
    items: &[Message],
) -> HashMap<String, Vec<FileReference>> {
    let mut file_map: HashMap<String, Vec<FileReference>> = HashMap::new();
    if !items.is_empty() {
        let msg_ids: Vec<&str> = items.iter().map(|m| m.id.as_str()).collect();
        let placeholders: Vec<String> = msg_ids.iter().map(|_| "?".to_string()).collect();
        let sql = format!(
            "SELECT message_id, file_name, file_type, file_size, file_path FROM message_files WHERE message_id IN ({})",
            placeholders.join(",")
        );
        let mut query = sqlx::query_as::<_, MessageFileRow>(&sql);
        for id in &msg_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(db).await.unwrap_or_default();
        for row in rows {
            file_map
                .entry(row.message_id)
                .or_default()
                .push(FileReference {
                    file_name: row.file_name,
                    file_type: row.file_type,
                    file_size: row.file_size,
                    file_path: row.file_path,
                });
        }
    }
    file_map
}

fn attach_files(
    items: Vec<Message>,
    mut file_map: HashMap<String, Vec<FileReference>>,
) -> Vec<MessageWithFiles> {
    items
        .into_iter()
        .map(|msg| {
            let files = file_map.remove(&msg.id).unwrap_or_default();
            MessageWithFiles {
                message: msg,
                files,
            }
        })
        .collect()
}

async fn load_session_response(
    db: &sqlx::SqlitePool,
    session_id: &str,
    appended_seqs: Vec<i64>,
) -> Result<SessionMessagesResponse, sqlx::Error> {
    let items = sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE session_id = ? ORDER BY seq ASC",
    )
    .bind(session_id)
    .fetch_all(db)
    .await?;

    let file_map = fetch_file_map(db, &items).await;

    Ok(SessionMessagesResponse {
        session_id: session_id.to_string(),
        messages: attach_files(items, file_map),
        appended_seqs,
    })
}

struct AppendOutcome {
    session_id: String,
    seqs: Vec<i64>,
}

/// Append the (user, assistant) pair in one transaction. Creating the session
/// when none was given happens inside the same transaction, so a failed
/// append never leaves an empty session behind.
async fn append_pair(
    db: &sqlx::SqlitePool,
    owner_id: &str,
    session_id: Option<&str>,
    text: &str,
    files: &[FileReference],
    request_id: Option<&str>,
) -> Result<AppendOutcome, sqlx::Error> {
    let now = chrono::Utc::now().to_rfc3339();
    let mut tx = db.begin().await?;

    let session_id = match session_id {
        Some(id) => id.to_string(),
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO chat_sessions (id, owner_id, created_at, updated_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(owner_id)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
            id
        }
    };

    let user_seq = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM messages WHERE session_id = ?",
    )
    .bind(&session_id)
    .fetch_one(&mut *tx)
    .await?;

    let content = if text.is_empty() {
        FILE_ONLY_PLACEHOLDER.to_string()
    } else {
        text.to_string()
    };

    let user_message_id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO messages (id, session_id, seq, role, content, request_id, created_at) VALUES (?, ?, ?, 'user', ?, ?, ?)",
    )
    .bind(&user_message_id)
    .bind(&session_id)
    .bind(user_seq)
    .bind(&content)
    .bind(request_id)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    for file in files {
        sqlx::query(
            "INSERT INTO message_files (id, message_id, file_name, file_type, file_size, file_path) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&user_message_id)
        .bind(&file.file_name)
        .bind(&file.file_type)
        .bind(file.file_size)
        .bind(&file.file_path)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "INSERT INTO messages (id, session_id, seq, role, content, created_at) VALUES (?, ?, ?, 'assistant', ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&session_id)
    .bind(user_seq + 1)
    .bind(ASSISTANT_ACK)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
        .bind(&now)
        .bind(&session_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(AppendOutcome {
        session_id,
        seqs: vec![user_seq, user_seq + 1],
    })
}

/// POST /api/sessions/messages
pub async fn append_messages(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<SendMessageRequest>,
) -> impl IntoResponse {
    let text = body.text.as_deref().unwrap_or("").trim().to_string();

    if let Err(message) = validate_outgoing_message(&text, body.files.len()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": message})),
        )
            .into_response();
    }

    // Locate the target session; unknown ids are never auto-created.
    let session_id = match &body.session_id {
        Some(id) => {
            let owned = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM chat_sessions WHERE id = ? AND owner_id = ?",
            )
            .bind(id)
            .bind(&user.id)
            .fetch_one(&state.db)
            .await
            .unwrap_or(0);

            if owned == 0 {
                return (
                    StatusCode::NOT_FOUND,
                    Json(serde_json::json!({"error": "Session not found"})),
                )
                    .into_response();
            }
            Some(id.clone())
        }
        None => None,
    };

    // Idempotency: a request id already recorded in this session means the
    // append already happened; return current state with nothing new tagged.
    if let (Some(id), Some(request_id)) = (&session_id, &body.request_id) {
        let seen = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE session_id = ? AND request_id = ?",
        )
        .bind(id)
        .bind(request_id)
        .fetch_one(&state.db)
        .await
        .unwrap_or(0);

        if seen > 0 {
            return match load_session_response(&state.db, id, Vec::new()).await {
                Ok(resp) => Json(resp).into_response(),
                Err(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": "Failed to load session"})),
                )
                    .into_response(),
            };
        }
    }

    let outcome = match append_pair(
        &state.db,
        &user.id,
        session_id.as_deref(),
        &text,
        &body.files,
        body.request_id.as_deref(),
    )
    .await
    {
        Ok(o) => o,
        Err(error) => {
            tracing::error!("failed to append messages: {}", error);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to save message"})),
            )
                .into_response();
        }
    };

    match load_session_response(&state.db, &outcome.session_id, outcome.seqs).await {
        Ok(resp) => Json(resp).into_response(),
        Err(error) => {
            tracing::error!("failed to load session after append: {}", error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to load session"})),
            )
                .into_response()
        }
    }
}

/// GET /api/sessions/:sessionId
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = sqlx::query_as::<_, ChatSession>(
        "SELECT * FROM chat_sessions WHERE id = ? AND owner_id = ?",
    )
    .bind(&session_id)
    .bind(&user.id)
    .fetch_optional(&state.db)
    .await
    .ok()
    .flatten();

    let session = match session {
        Some(s) => s,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "Session not found"})),
            )
                .into_response()
        }
    };

    let items = sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE session_id = ? ORDER BY seq ASC",
    )
    .bind(&session.id)
    .fetch_all(&state.db)
    .await
    .unwrap_or_default();

    let file_map = fetch_file_map(&state.db, &items).await;

    Json(serde_json::json!({
        "id": session.id,
        "createdAt": session.created_at,
        "updatedAt": session.updated_at,
        "messages": attach_files(items, file_map),
    }))
    .into_response()
}

/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> impl IntoResponse {
    let sessions = sqlx::query_as::<_, SessionSummary>(
        r#"SELECT cs.id, cs.created_at, cs.updated_at,
                  (SELECT COUNT(*) FROM messages m WHERE m.session_id = cs.id) AS message_count
           FROM chat_sessions cs
           WHERE cs.owner_id = ?
           ORDER BY cs.updated_at DESC
           LIMIT ?"#,
    )
    .bind(&user.id)
    .bind(SESSION_LIST_LIMIT)
    .fetch_all(&state.db)
    .await
    .unwrap_or_default();

    Json(sessions).into_response()
}
