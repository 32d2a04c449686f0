//! Summarizer implementations behind one trait.
//!
//! The generative client talks to the language API directly; the analysis
//! client delegates the whole job to the external text-analysis service.
//! Which one runs is a config choice, the pipeline does not care.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced while turning extracted text into a summary.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Endpoint could not be reached at all.
    #[error("summarization service unavailable: {0}")]
    Unavailable(String),
    /// Endpoint answered with an error status.
    #[error("failed to generate summary: {0}")]
    Generation(String),
    /// Endpoint answered 2xx with a body we cannot use. Carries the raw body.
    #[error("malformed summarizer response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, file_name: &str) -> Result<String, SummarizeError>;
}

fn build_prompt(text: &str) -> String {
    format!(
        "Extract the key information from the following document and give a clear summary.\nDocument text:\n{}",
        text
    )
}

// ── Direct generative client ───────────────────────────────────────────────

pub struct GenerativeSummarizer {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GenerativeSummarizer {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Summarizer for GenerativeSummarizer {
    async fn summarize(&self, text: &str, _file_name: &str) -> Result<String, SummarizeError> {
        let payload = json!({
            "contents": [{ "parts": [{ "text": build_prompt(text) }] }]
        });

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizeError::Unavailable(format!(
                    "failed to reach {}: {}",
                    self.base_url, error
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Generation(format!(
                "generative API returned {}: {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|error| {
            SummarizeError::InvalidResponse(format!("failed to decode response: {}", error))
        })?;

        let summary = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        if summary.trim().is_empty() {
            return Err(SummarizeError::InvalidResponse(
                "response contained no candidate text".into(),
            ));
        }

        Ok(summary.trim().to_string())
    }
}

// ── Delegated analysis-service client ──────────────────────────────────────

pub struct AnalysisServiceSummarizer {
    http: Client,
    base_url: String,
}

impl AnalysisServiceSummarizer {
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/process-text", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Summarizer for AnalysisServiceSummarizer {
    async fn summarize(&self, text: &str, file_name: &str) -> Result<String, SummarizeError> {
        let payload = json!({ "text": text, "filename": file_name });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizeError::Unavailable(format!(
                    "failed to reach analysis service at {}: {}",
                    self.base_url, error
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Generation(format!(
                "analysis service returned {}: {}",
                status, body
            )));
        }

        // Keep the raw body around: a malformed answer is reported with it
        // attached so the failure can be diagnosed from logs alone.
        let raw = response.text().await.map_err(|error| {
            SummarizeError::InvalidResponse(format!("failed to read response body: {}", error))
        })?;

        let value: serde_json::Value = serde_json::from_str(&raw).map_err(|_| {
            SummarizeError::InvalidResponse(format!("non-JSON response body: {}", raw))
        })?;

        match value.get("summary").and_then(|s| s.as_str()) {
            Some(summary) if !summary.is_empty() => Ok(summary.to_string()),
            _ => Err(SummarizeError::InvalidResponse(format!(
                "response missing summary field: {}",
                raw
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    #[tokio::test]
    async fn analysis_service_returns_summary() {
        let server = MockServer::start_async().await;
        let client = AnalysisServiceSummarizer::new(server.base_url());

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/process-text")
                    .json_body_partial(r#"{"filename": "lease.pdf"}"#);
                then.status(200)
                    .json_body(json!({ "summary": "A 12-month lease.", "indexed": true }));
            })
            .await;

        let summary = client
            .summarize("lease text", "lease.pdf")
            .await
            .expect("summary");

        mock.assert();
        assert_eq!(summary, "A 12-month lease.");
    }

    #[tokio::test]
    async fn analysis_service_unexpected_shape_carries_raw_body() {
        let server = MockServer::start_async().await;
        let client = AnalysisServiceSummarizer::new(server.base_url());

        server
            .mock_async(|when, then| {
                when.method(POST).path("/process-text");
                then.status(200).json_body(json!({ "unexpected": "shape" }));
            })
            .await;

        let error = client
            .summarize("text", "a.pdf")
            .await
            .expect_err("malformed response");

        match error {
            SummarizeError::InvalidResponse(detail) => {
                assert!(detail.contains("unexpected"), "raw body missing: {}", detail)
            }
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn analysis_service_non_json_body_is_invalid() {
        let server = MockServer::start_async().await;
        let client = AnalysisServiceSummarizer::new(server.base_url());

        server
            .mock_async(|when, then| {
                when.method(POST).path("/process-text");
                then.status(200).body("<html>gateway timeout</html>");
            })
            .await;

        let error = client
            .summarize("text", "a.pdf")
            .await
            .expect_err("non-JSON body");

        match error {
            SummarizeError::InvalidResponse(detail) => {
                assert!(detail.contains("gateway timeout"))
            }
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn generative_client_parses_candidates() {
        let server = MockServer::start_async().await;
        let client = GenerativeSummarizer::new(server.base_url(), "test-key".into(), "m1".into());

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/m1:generateContent")
                    .query_param("key", "test-key");
                then.status(200).json_body(json!({
                    "candidates": [
                        { "content": { "parts": [{ "text": "  Key points.  " }] } }
                    ]
                }));
            })
            .await;

        let summary = client.summarize("doc", "doc.txt").await.expect("summary");

        mock.assert();
        assert_eq!(summary, "Key points.");
    }

    #[tokio::test]
    async fn generative_client_error_status_fails_generation() {
        let server = MockServer::start_async().await;
        let client = GenerativeSummarizer::new(server.base_url(), "k".into(), "m1".into());

        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/m1:generateContent");
                then.status(429).body("quota exceeded");
            })
            .await;

        let error = client
            .summarize("doc", "doc.txt")
            .await
            .expect_err("quota error");

        assert!(matches!(error, SummarizeError::Generation(detail) if detail.contains("429")));
    }

    #[tokio::test]
    async fn generative_client_empty_candidates_is_invalid() {
        let server = MockServer::start_async().await;
        let client = GenerativeSummarizer::new(server.base_url(), "k".into(), "m1".into());

        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/m1:generateContent");
                then.status(200).json_body(json!({ "candidates": [] }));
            })
            .await;

        let error = client
            .summarize("doc", "doc.txt")
            .await
            .expect_err("empty candidates");

        assert!(matches!(error, SummarizeError::InvalidResponse(_)));
    }
}
