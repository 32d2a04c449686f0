use std::sync::Arc;

use thiserror::Error;

use super::extract::{extract_text, ExtractError};
use super::summarize::{SummarizeError, Summarizer};

/// Errors from a full ingestion run. Either stage aborts the request; there
/// is no fallback summary.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),
    #[error("summarization failed: {0}")]
    Summarization(#[from] SummarizeError),
}

/// Composes text extraction and summarization for one uploaded document.
pub struct IngestionPipeline {
    summarizer: Arc<dyn Summarizer>,
    input_char_budget: usize,
}

impl IngestionPipeline {
    pub fn new(summarizer: Arc<dyn Summarizer>, input_char_budget: usize) -> Self {
        Self {
            summarizer,
            input_char_budget,
        }
    }

    /// received → extracted → summarized → done, or failed from either stage.
    pub async fn run(
        &self,
        data: &[u8],
        file_name: &str,
        mime: &str,
    ) -> Result<String, IngestError> {
        let text = extract_text(data, file_name, mime)?;
        tracing::debug!(file = file_name, chars = text.chars().count(), "document extracted");

        let summary = if text.chars().count() <= self.input_char_budget {
            self.summarizer.summarize(&text, file_name).await?
        } else {
            // Over budget: summarize word-boundary chunks, then summarize the
            // joined chunk summaries once more.
            let chunks = chunk_text(&text, self.input_char_budget);
            tracing::info!(
                file = file_name,
                chunks = chunks.len(),
                "input over budget, merging chunk summaries"
            );

            let total = chunks.len();
            let mut parts = Vec::with_capacity(total);
            for (index, chunk) in chunks.iter().enumerate() {
                let label = format!("{} (part {}/{})", file_name, index + 1, total);
                parts.push(self.summarizer.summarize(chunk, &label).await?);
            }

            let merged = parts.join("\n\n");
            self.summarizer.summarize(&merged, file_name).await?
        };

        tracing::debug!(file = file_name, "document summarized");
        Ok(summary)
    }
}

/// Split text into word-boundary chunks of at most `max_chars` characters.
/// A single word longer than the budget becomes its own oversized chunk.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return vec![];
    }
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current_chars > 0 && current_chars + word_chars + 1 > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if current_chars > 0 {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingSummarizer {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingSummarizer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Summarizer for RecordingSummarizer {
        async fn summarize(&self, text: &str, _file_name: &str) -> Result<String, SummarizeError> {
            self.calls.lock().unwrap().push(text.to_string());
            Ok(format!("summary of {} chars", text.chars().count()))
        }
    }

    #[test]
    fn chunking_respects_word_boundaries() {
        let chunks = chunk_text("alpha beta gamma delta", 11);
        assert_eq!(chunks, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("short", 100), vec!["short"]);
        assert!(chunk_text("   ", 100).is_empty());
    }

    #[tokio::test]
    async fn small_input_is_single_shot() {
        let summarizer = RecordingSummarizer::new();
        let pipeline = IngestionPipeline::new(summarizer.clone(), 1000);

        pipeline
            .run(b"a short filing", "filing.txt", "text/plain")
            .await
            .expect("summary");

        assert_eq!(summarizer.call_count(), 1);
    }

    #[tokio::test]
    async fn oversized_input_chunks_and_merges() {
        let summarizer = RecordingSummarizer::new();
        let pipeline = IngestionPipeline::new(summarizer.clone(), 16);

        let text = "one two three four five six seven eight nine ten";
        pipeline
            .run(text.as_bytes(), "long.txt", "text/plain")
            .await
            .expect("summary");

        let chunks = chunk_text(text, 16);
        assert!(chunks.len() > 1);
        // One call per chunk plus the merge pass.
        assert_eq!(summarizer.call_count(), chunks.len() + 1);
    }

    #[tokio::test]
    async fn extraction_error_aborts_before_summarization() {
        let summarizer = RecordingSummarizer::new();
        let pipeline = IngestionPipeline::new(summarizer.clone(), 1000);

        let error = pipeline
            .run(&[0u8; 4], "blob.bin", "application/octet-stream")
            .await
            .expect_err("unsupported input");

        assert!(matches!(error, IngestError::Extraction(_)));
        assert_eq!(summarizer.call_count(), 0);
    }
}
