use std::sync::Arc;

use axum::http::{HeaderName, Method};
use lexchat_server::{config::Config, db, ingest, routes, AppState};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lexchat_server=info".into()),
        )
        .init();

    let config = Config::from_env();

    // Initialize database
    let pool = db::init_pool(&config.database_path)
        .await
        .expect("Failed to initialize database");

    // Upload directory must exist before the first multipart request lands
    std::fs::create_dir_all(&config.upload_dir).expect("Failed to create upload directory");

    let pipeline = ingest::IngestionPipeline::new(
        ingest::build_summarizer(&config),
        config.summary_input_char_budget,
    );

    let state = Arc::new(AppState {
        db: pool,
        config: config.clone(),
        pipeline,
    });

    // Build router
    let app = routes::build_router(state.clone()).layer(
        CorsLayer::new()
            .allow_origin(tower_http::cors::AllowOrigin::mirror_request())
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([
                HeaderName::from_static("content-type"),
                HeaderName::from_static("cookie"),
                HeaderName::from_static("authorization"),
            ])
            .allow_credentials(true),
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind");

    tracing::info!("Lexchat server running on {}", addr);

    axum::serve(listener, app).await.expect("Server error");
}
