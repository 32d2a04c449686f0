use std::sync::{Arc, Mutex};

use lexchat_shared::constants::FILE_ONLY_PLACEHOLDER;

use crate::api::ApiClient;
use crate::toast::{Severity, ToastQueue, DEFAULT_TOAST_DURATION};
use crate::types::{ChatMessage, FileDisplay, FileReference, Role, SendMessageBody};

/// Shown as a local assistant turn when the server cannot be reached. The
/// optimistic user message stays; nothing is retried.
pub const CONNECTION_TROUBLE: &str =
    "I couldn't reach the server just now. Your message is shown here but hasn't been delivered; please try sending again in a moment.";

struct SyncState {
    session_id: Option<String>,
    history: Vec<ChatMessage>,
    // Highest server seq seen; reconciliation only appends past it.
    last_seq: i64,
}

/// Owns the optimistic local history and reconciles it against the server's
/// authoritative append responses by sequence number.
#[derive(Clone)]
pub struct ChatSyncController {
    api: ApiClient,
    toasts: ToastQueue,
    state: Arc<Mutex<SyncState>>,
}

impl ChatSyncController {
    /// The session identifier is explicit injected state; there is no hidden
    /// process-wide current session.
    pub fn new(api: ApiClient, toasts: ToastQueue, session_id: Option<String>) -> Self {
        Self {
            api,
            toasts,
            state: Arc::new(Mutex::new(SyncState {
                session_id,
                history: Vec::new(),
                last_seq: 0,
            })),
        }
    }

    pub fn session_id(&self) -> Option<String> {
        self.state.lock().unwrap().session_id.clone()
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.state.lock().unwrap().history.clone()
    }

    /// Optimistically append the user message, submit it, and reconcile the
    /// assistant reply from the response. A blank send is a no-op.
    pub async fn send(&self, text: &str, files: Vec<FileReference>) {
        let trimmed = text.trim();
        if trimmed.is_empty() && files.is_empty() {
            return;
        }

        let content = if trimmed.is_empty() {
            FILE_ONLY_PLACEHOLDER.to_string()
        } else {
            trimmed.to_string()
        };

        let session_id = {
            let mut state = self.state.lock().unwrap();
            state.history.push(ChatMessage {
                id: uuid::Uuid::new_v4().to_string(),
                role: Role::User,
                content,
                timestamp: chrono::Utc::now().to_rfc3339(),
                files: files.iter().map(FileDisplay::from).collect(),
            });
            state.session_id.clone()
        };

        let body = SendMessageBody {
            text: trimmed.to_string(),
            files,
            session_id,
            request_id: uuid::Uuid::new_v4().to_string(),
        };

        match self.api.send_message(&body).await {
            Ok(response) => {
                let mut state = self.state.lock().unwrap();
                state.session_id = Some(response.session_id);

                let watermark = state.last_seq;
                for message in response.messages {
                    let seq = message.seq;
                    // The user copy already sits in local history; only new
                    // assistant turns come across.
                    if seq > watermark && message.role == Role::Assistant {
                        state.history.push(ChatMessage::from(message));
                    }
                    state.last_seq = state.last_seq.max(seq);
                }
            }
            Err(error) => {
                tracing::warn!("send failed: {}", error);
                let mut state = self.state.lock().unwrap();
                state.history.push(ChatMessage {
                    id: uuid::Uuid::new_v4().to_string(),
                    role: Role::Assistant,
                    content: CONNECTION_TROUBLE.to_string(),
                    timestamp: chrono::Utc::now().to_rfc3339(),
                    files: Vec::new(),
                });
            }
        }
    }

    /// Replace local history wholesale from the persisted session. Failure
    /// leaves whatever was on screen and surfaces a toast instead.
    pub async fn restore(&self, session_id: &str) {
        match self.api.fetch_session(session_id).await {
            Ok(detail) => {
                let mut state = self.state.lock().unwrap();
                state.session_id = Some(detail.id);
                state.last_seq = detail.messages.iter().map(|m| m.seq).max().unwrap_or(0);
                state.history = detail.messages.into_iter().map(ChatMessage::from).collect();
            }
            Err(error) => {
                tracing::warn!("failed to restore session {}: {}", session_id, error);
                self.toasts.push(
                    "Could not restore this conversation",
                    Severity::Error,
                    DEFAULT_TOAST_DURATION,
                );
            }
        }
    }
}
