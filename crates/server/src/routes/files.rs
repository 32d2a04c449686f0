use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use lexchat_shared::constants::FILE_LIST_LIMIT;

use crate::models::{AuthUser, FileAsset};
use crate::AppState;

/// GET /api/files
pub async fn list_files(State(state): State<Arc<AppState>>, user: AuthUser) -> impl IntoResponse {
    let files = sqlx::query_as::<_, FileAsset>(
        "SELECT * FROM file_assets WHERE owner_id = ? ORDER BY uploaded_at DESC LIMIT ?",
    )
    .bind(&user.id)
    .bind(FILE_LIST_LIMIT)
    .fetch_all(&state.db)
    .await
    .unwrap_or_default();

    Json(files).into_response()
}

/// DELETE /api/files/:fileId
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(file_id): Path<String>,
) -> impl IntoResponse {
    let asset = sqlx::query_as::<_, FileAsset>(
        "SELECT * FROM file_assets WHERE id = ? AND owner_id = ?",
    )
    .bind(&file_id)
    .bind(&user.id)
    .fetch_optional(&state.db)
    .await
    .ok()
    .flatten();

    let asset = match asset {
        Some(a) => a,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "File not found"})),
            )
                .into_response()
        }
    };

    // Remove the blob first; a missing file on disk is not an error.
    let _ = tokio::fs::remove_file(&asset.file_path).await;

    let result = sqlx::query("DELETE FROM file_assets WHERE id = ?")
        .bind(&asset.id)
        .execute(&state.db)
        .await;

    if result.is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to delete file record"})),
        )
            .into_response();
    }

    Json(serde_json::json!({"message": "File deleted"})).into_response()
}

/// GET /api/files/:fileId/download
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(file_id): Path<String>,
) -> impl IntoResponse {
    let asset = sqlx::query_as::<_, FileAsset>(
        "SELECT * FROM file_assets WHERE id = ? AND owner_id = ?",
    )
    .bind(&file_id)
    .bind(&user.id)
    .fetch_optional(&state.db)
    .await
    .ok()
    .flatten();

    let asset = match asset {
        Some(a) => a,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "File not found"})),
            )
                .into_response()
        }
    };

    let file = match tokio::fs::File::open(&asset.file_path).await {
        Ok(f) => f,
        Err(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "File not found on disk"})),
            )
                .into_response()
        }
    };

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let disposition = if asset.file_type.starts_with("image/") {
        "inline".to_string()
    } else {
        format!("attachment; filename=\"{}\"", asset.original_name)
    };

    (
        [
            (header::CONTENT_TYPE, asset.file_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}
