use thiserror::Error;

use lexchat_shared::validation::file_extension;

/// Errors surfaced while turning a document blob into text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported document type: {0}")]
    Unsupported(String),
    #[error("failed to read document: {0}")]
    Unreadable(String),
}

enum DocumentKind {
    Pdf,
    Text,
    Other,
}

impl DocumentKind {
    fn detect(file_name: &str, mime: &str) -> Self {
        let ext = file_extension(file_name).unwrap_or_default();
        if mime == "application/pdf" || ext == "pdf" {
            DocumentKind::Pdf
        } else if mime.starts_with("text/") || matches!(ext.as_str(), "txt" | "md" | "markdown") {
            DocumentKind::Text
        } else {
            DocumentKind::Other
        }
    }
}

/// Extract plain text from a stored document. All-or-nothing: a document
/// either yields its full text or an error, never a partial result.
pub fn extract_text(data: &[u8], file_name: &str, mime: &str) -> Result<String, ExtractError> {
    match DocumentKind::detect(file_name, mime) {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(data)
            .map_err(|e| ExtractError::Unreadable(format!("PDF parse error: {}", e))),
        DocumentKind::Text => String::from_utf8(data.to_vec())
            .map_err(|e| ExtractError::Unreadable(format!("invalid UTF-8 text: {}", e))),
        DocumentKind::Other => Err(ExtractError::Unsupported(format!(
            "{} ({})",
            file_name, mime
        ))),
    }
}
