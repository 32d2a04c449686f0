pub mod config;
pub mod db;
pub mod ingest;
pub mod middleware;
pub mod models;
pub mod routes;

use config::Config;
use ingest::IngestionPipeline;

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Config,
    pub pipeline: IngestionPipeline,
}
