use std::env;

use lexchat_shared::constants::MAX_UPLOAD_BYTES;

/// Which Summarizer implementation the ingestion pipeline uses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SummarizerProvider {
    /// Call the generative-language API directly.
    Generative,
    /// Delegate to the external text-analysis service.
    AnalysisService,
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub upload_dir: String,
    pub max_upload_bytes: u64,
    pub summarizer_provider: SummarizerProvider,
    pub generative_api_url: String,
    pub generative_api_key: String,
    pub generative_model: String,
    pub analysis_service_url: String,
    pub summary_input_char_budget: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./lexchat.db".into()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_UPLOAD_BYTES),
            summarizer_provider: match env::var("SUMMARIZER_PROVIDER").as_deref() {
                Ok("analysis-service") => SummarizerProvider::AnalysisService,
                _ => SummarizerProvider::Generative,
            },
            generative_api_url: env::var("GENERATIVE_API_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into()),
            generative_api_key: env::var("GENERATIVE_API_KEY").unwrap_or_default(),
            generative_model: env::var("GENERATIVE_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".into()),
            analysis_service_url: env::var("ANALYSIS_SERVICE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000".into()),
            summary_input_char_budget: env::var("SUMMARY_INPUT_CHAR_BUDGET")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24_000),
        }
    }
}
