use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the locally visible history.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    pub files: Vec<FileDisplay>,
}

/// Local display shape for a file attached to a message.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDisplay {
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub path: String,
}

// ── Wire types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub file_path: String,
}

impl From<&FileReference> for FileDisplay {
    fn from(file: &FileReference) -> Self {
        Self {
            name: file.file_name.clone(),
            mime: file.file_type.clone(),
            size: file.file_size,
            path: file.file_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    pub id: String,
    pub seq: i64,
    pub role: Role,
    pub content: String,
    pub created_at: String,
    #[serde(default)]
    pub files: Vec<FileReference>,
}

impl From<ServerMessage> for ChatMessage {
    fn from(message: ServerMessage) -> Self {
        Self {
            id: message.id,
            role: message.role,
            content: message.content,
            timestamp: message.created_at,
            files: message.files.iter().map(FileDisplay::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageBody {
    pub text: String,
    pub files: Vec<FileReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub request_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub session_id: String,
    pub messages: Vec<ServerMessage>,
    #[serde(default)]
    pub appended_seqs: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub messages: Vec<ServerMessage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: String,
    pub file_name: String,
    pub original_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub file_path: String,
}
