use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub text: String,
    pub severity: Severity,
}

struct ToastInner {
    entries: Mutex<Vec<Toast>>,
    timers: Mutex<HashMap<u64, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl Drop for ToastInner {
    fn drop(&mut self) {
        // Teardown must not leave auto-dismiss timers running.
        for (_, handle) in self.timers.lock().unwrap().drain() {
            handle.abort();
        }
    }
}

/// Multi-item notification channel. Entries keep push order, duplicates are
/// allowed, and each entry with a non-zero duration dismisses itself once.
#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<ToastInner>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ToastInner {
                entries: Mutex::new(Vec::new()),
                timers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Zero duration means the toast stays until dismissed.
    pub fn push(&self, text: impl Into<String>, severity: Severity, duration: Duration) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.entries.lock().unwrap().push(Toast {
            id,
            text: text.into(),
            severity,
        });

        if !duration.is_zero() {
            // The timer holds a weak handle so a dropped queue tears the
            // timer down instead of the timer keeping the queue alive.
            let weak = Arc::downgrade(&self.inner);
            let handle = tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                if let Some(inner) = weak.upgrade() {
                    inner.entries.lock().unwrap().retain(|t| t.id != id);
                    inner.timers.lock().unwrap().remove(&id);
                }
            });
            self.inner.timers.lock().unwrap().insert(id, handle);
        }

        id
    }

    pub fn dismiss(&self, id: u64) {
        if let Some(handle) = self.inner.timers.lock().unwrap().remove(&id) {
            handle.abort();
        }
        self.inner.entries.lock().unwrap().retain(|t| t.id != id);
    }

    pub fn dismiss_all(&self) {
        for (_, handle) in self.inner.timers.lock().unwrap().drain() {
            handle.abort();
        }
        self.inner.entries.lock().unwrap().clear();
    }

    /// Snapshot of the visible toasts, in push order.
    pub fn visible(&self) -> Vec<Toast> {
        self.inner.entries.lock().unwrap().clone()
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}
