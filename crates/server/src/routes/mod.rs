pub mod auth;
pub mod documents;
pub mod files;
pub mod sessions;
pub mod uploads;

use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Leave headroom above the upload cap so oversized files reach the
    // handler's own size check instead of the framework default.
    let body_limit = state.config.max_upload_bytes as usize + 1024 * 1024;

    let auth_routes = Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out));

    let api_routes = Router::new()
        // Chat sessions
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/messages", post(sessions::append_messages))
        .route("/sessions/{sessionId}", get(sessions::get_session))
        // Uploads & assets
        .route("/uploads", post(uploads::upload))
        .route("/files", get(files::list_files))
        .route("/files/{fileId}", delete(files::delete_file))
        .route("/files/{fileId}/download", get(files::download_file))
        // Document ingestion
        .route("/documents/summarize", post(documents::summarize));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
