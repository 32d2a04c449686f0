use serde::{Deserialize, Serialize};

/// Denormalized file metadata embedded in a message.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub file_path: String,
}

/// Canonical record of an uploaded file, one row per blob on disk.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileAsset {
    pub id: String,
    pub owner_id: String,
    pub file_name: String,
    pub original_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub file_path: String,
    pub uploaded_at: String,
}
