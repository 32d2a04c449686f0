use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use std::sync::OnceLock;

use lexchat_shared::validation::file_extension;

use crate::models::AuthUser;
use crate::AppState;

fn allowed_types() -> &'static regex_lite::Regex {
    static ALLOWED: OnceLock<regex_lite::Regex> = OnceLock::new();
    ALLOWED.get_or_init(|| {
        regex_lite::Regex::new("jpeg|jpg|png|gif|pdf|doc|docx|txt").expect("valid pattern")
    })
}

/// Extension and declared MIME type must both check out. Plain-text MIME
/// types never mention their extension, so `text/*` passes on its own.
fn is_allowed_upload(file_name: &str, mime: &str) -> bool {
    let ext = match file_extension(file_name) {
        Some(e) => e,
        None => return false,
    };
    allowed_types().is_match(&ext) && (allowed_types().is_match(mime) || mime.starts_with("text/"))
}

/// POST /api/uploads
pub async fn upload(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let field = match multipart.next_field().await {
        Ok(Some(f)) => f,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "No file provided"})),
            )
                .into_response()
        }
    };

    let original_name = field.file_name().unwrap_or("file").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let data = match field.bytes().await {
        Ok(d) => d,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Failed to read file"})),
            )
                .into_response()
        }
    };

    let size = data.len() as u64;
    if size > state.config.max_upload_bytes {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(serde_json::json!({
                "error": format!("File too large. Max size: {} MB", state.config.max_upload_bytes / 1_048_576)
            })),
        )
            .into_response();
    }

    if !is_allowed_upload(&original_name, &content_type) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid file type"})),
        )
            .into_response();
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now();
    let ext = file_extension(&original_name).unwrap_or_else(|| "bin".into());
    let stored_name = format!(
        "file-{}-{}.{}",
        now.timestamp_millis(),
        nanoid::nanoid!(9),
        ext
    );

    std::fs::create_dir_all(&state.config.upload_dir).ok();
    let file_path = std::path::Path::new(&state.config.upload_dir).join(&stored_name);

    if tokio::fs::write(&file_path, &data).await.is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to save file"})),
        )
            .into_response();
    }

    let file_path_str = file_path.to_string_lossy().to_string();
    let result = sqlx::query(
        r#"INSERT INTO file_assets (id, owner_id, file_name, original_name, file_type, file_size, file_path, uploaded_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&user.id)
    .bind(&stored_name)
    .bind(&original_name)
    .bind(&content_type)
    .bind(size as i64)
    .bind(&file_path_str)
    .bind(now.to_rfc3339())
    .execute(&state.db)
    .await;

    if result.is_err() {
        // Clean up the blob on DB error
        let _ = tokio::fs::remove_file(&file_path).await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to save file record"})),
        )
            .into_response();
    }

    Json(serde_json::json!({
        "id": id,
        "fileName": stored_name,
        "originalName": original_name,
        "fileType": content_type,
        "fileSize": size,
        "filePath": file_path_str,
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_requires_both_extension_and_mime() {
        assert!(is_allowed_upload("brief.pdf", "application/pdf"));
        assert!(is_allowed_upload("notes.txt", "text/plain; charset=utf-8"));
        assert!(is_allowed_upload("scan.jpg", "image/jpeg"));
        assert!(!is_allowed_upload("payload.exe", "application/pdf"));
        assert!(!is_allowed_upload("brief.pdf", "application/octet-stream"));
        assert!(!is_allowed_upload("noextension", "application/pdf"));
    }
}
