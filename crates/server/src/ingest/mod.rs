//! Document ingestion: stored blob → plain text → summary.
//!
//! The pipeline runs per request and holds no cross-request state. Extraction
//! is all-or-nothing per document; summarization goes through the [`Summarizer`]
//! trait so the generative API and the external analysis service stay
//! interchangeable.

mod extract;
mod pipeline;
mod summarize;

pub use extract::{extract_text, ExtractError};
pub use pipeline::{IngestError, IngestionPipeline};
pub use summarize::{
    AnalysisServiceSummarizer, GenerativeSummarizer, SummarizeError, Summarizer,
};

use std::sync::Arc;

use crate::config::{Config, SummarizerProvider};

/// Build the configured Summarizer implementation.
pub fn build_summarizer(config: &Config) -> Arc<dyn Summarizer> {
    match config.summarizer_provider {
        SummarizerProvider::Generative => Arc::new(GenerativeSummarizer::new(
            config.generative_api_url.clone(),
            config.generative_api_key.clone(),
            config.generative_model.clone(),
        )),
        SummarizerProvider::AnalysisService => Arc::new(AnalysisServiceSummarizer::new(
            config.analysis_service_url.clone(),
        )),
    }
}
