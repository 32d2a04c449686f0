use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::ingest::IngestError;
use crate::models::AuthUser;
use crate::AppState;

/// POST /api/documents/summarize
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let field = match multipart.next_field().await {
        Ok(Some(f)) => f,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "No file uploaded"})),
            )
                .into_response()
        }
    };

    let file_name = field.file_name().unwrap_or("document").to_string();
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

    match state.pipeline.run(&data, &file_name, &content_type).await {
        Ok(summary) => Json(serde_json::json!({"summary": summary})).into_response(),
        Err(error) => {
            tracing::error!(file = %file_name, "document processing failed: {}", error);
            let message = match &error {
                IngestError::Extraction(_) => "Failed to extract document text",
                IngestError::Summarization(_) => "Failed to summarize document",
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": message, "detail": error.to_string()})),
            )
                .into_response()
        }
    }
}
