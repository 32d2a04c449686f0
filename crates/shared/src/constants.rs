pub const APP_NAME: &str = "Lexchat";

// Limits
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_MESSAGE_LENGTH: usize = 4000;
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const SESSION_LIST_LIMIT: i64 = 50;
pub const FILE_LIST_LIMIT: i64 = 100;

// Message content substituted when a user sends attachments with no text.
pub const FILE_ONLY_PLACEHOLDER: &str = "[File only message]";

// Canned acknowledgment appended as the assistant half of every message pair.
pub const ASSISTANT_ACK: &str =
    "I've received your message and files. I'm analyzing them now and will provide you with insights shortly.";

// Allowed upload extensions. The declared MIME type must also mention one of
// these tokens (e.g. "application/pdf", "image/png").
pub const ALLOWED_FILE_TYPES: &[&str] = &["jpeg", "jpg", "png", "gif", "pdf", "doc", "docx", "txt"];
