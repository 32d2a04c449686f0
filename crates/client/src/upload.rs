use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use lexchat_shared::constants::MAX_UPLOAD_BYTES;

use crate::api::ApiClient;
use crate::toast::{Severity, ToastQueue, DEFAULT_TOAST_DURATION};
use crate::types::FileReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Queued,
    Uploading,
    Confirmed,
    Failed,
}

/// Ephemeral tracking of one file moving through its upload lifecycle.
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub status: UploadStatus,
    pub asset_id: Option<String>,
    pub file_path: Option<String>,
}

/// A file picked in the composer, already read into memory.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Owns the in-flight upload list. Each selected file uploads independently;
/// callers must hold off sending while `is_uploading()` reports true.
#[derive(Clone)]
pub struct FileUploadController {
    api: ApiClient,
    toasts: ToastQueue,
    tasks: Arc<Mutex<Vec<UploadTask>>>,
    jobs: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl FileUploadController {
    pub fn new(api: ApiClient, toasts: ToastQueue) -> Self {
        Self {
            api,
            toasts,
            tasks: Arc::new(Mutex::new(Vec::new())),
            jobs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Start uploading a selected file. Files over the size cap fail on the
    /// spot without any network traffic; the returned snapshot says so.
    pub fn select(&self, file: SelectedFile) -> UploadTask {
        let size = file.bytes.len() as u64;
        let mut task = UploadTask {
            id: uuid::Uuid::new_v4().to_string(),
            file_name: file.name.clone(),
            file_type: file.mime.clone(),
            file_size: size,
            status: UploadStatus::Queued,
            asset_id: None,
            file_path: None,
        };

        if size > MAX_UPLOAD_BYTES {
            task.status = UploadStatus::Failed;
            self.toasts.push(
                format!(
                    "{} is larger than the {} MB limit",
                    file.name,
                    MAX_UPLOAD_BYTES / 1_048_576
                ),
                Severity::Error,
                DEFAULT_TOAST_DURATION,
            );
            return task;
        }

        task.status = UploadStatus::Uploading;
        self.tasks.lock().unwrap().push(task.clone());

        let api = self.api.clone();
        let toasts = self.toasts.clone();
        let tasks = Arc::clone(&self.tasks);
        let task_id = task.id.clone();

        let handle = tokio::spawn(async move {
            match api.upload_file(&file.name, &file.mime, file.bytes).await {
                Ok(confirmed) => {
                    let mut tasks = tasks.lock().unwrap();
                    if let Some(t) = tasks.iter_mut().find(|t| t.id == task_id) {
                        t.status = UploadStatus::Confirmed;
                        // Server-confirmed name wins over the local pick.
                        t.file_name = confirmed.original_name;
                        t.file_type = confirmed.file_type;
                        t.file_size = confirmed.file_size;
                        t.asset_id = Some(confirmed.id);
                        t.file_path = Some(confirmed.file_path);
                    }
                    drop(tasks);
                    toasts.push(
                        format!("{} uploaded", file.name),
                        Severity::Success,
                        DEFAULT_TOAST_DURATION,
                    );
                }
                Err(error) => {
                    tracing::warn!("upload of {} failed: {}", file.name, error);
                    // Failed tasks are not retryable in place: mark, then drop
                    // from the active list so the user re-selects.
                    let mut tasks = tasks.lock().unwrap();
                    if let Some(t) = tasks.iter_mut().find(|t| t.id == task_id) {
                        t.status = UploadStatus::Failed;
                    }
                    tasks.retain(|t| t.id != task_id);
                    drop(tasks);
                    toasts.push(
                        format!("Failed to upload {}", file.name),
                        Severity::Error,
                        DEFAULT_TOAST_DURATION,
                    );
                }
            }
        });
        self.jobs.lock().unwrap().push(handle);

        task
    }

    /// Drop a task from the active list. Refused while the task is still
    /// uploading; never touches the server.
    pub fn remove(&self, task_id: &str) -> bool {
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(pos) = tasks.iter().position(|t| t.id == task_id) {
            if tasks[pos].status == UploadStatus::Uploading {
                return false;
            }
            tasks.remove(pos);
            return true;
        }
        false
    }

    pub fn is_uploading(&self) -> bool {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .any(|t| t.status == UploadStatus::Uploading)
    }

    pub fn tasks(&self) -> Vec<UploadTask> {
        self.tasks.lock().unwrap().clone()
    }

    /// Descriptors for every confirmed upload, ready to attach to a message.
    pub fn confirmed_files(&self) -> Vec<FileReference> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.status == UploadStatus::Confirmed)
            .map(task_to_reference)
            .collect()
    }

    /// Clear the task list for an outgoing message. Returns the confirmed
    /// descriptors plus the names of any tasks that were dropped without
    /// confirming, so the caller can tell the user what fell out.
    pub fn drain_for_send(&self) -> (Vec<FileReference>, Vec<String>) {
        let drained: Vec<UploadTask> = self.tasks.lock().unwrap().drain(..).collect();
        let mut confirmed = Vec::new();
        let mut dropped = Vec::new();
        for task in &drained {
            if task.status == UploadStatus::Confirmed {
                confirmed.push(task_to_reference(task));
            } else {
                dropped.push(task.file_name.clone());
            }
        }
        (confirmed, dropped)
    }

    /// Wait for every in-flight upload job to finish. Mostly for tests and
    /// orderly shutdown; the UI watches task snapshots instead.
    pub async fn wait_idle(&self) {
        loop {
            let handle = self.jobs.lock().unwrap().pop();
            match handle {
                Some(h) => {
                    let _ = h.await;
                }
                None => break,
            }
        }
    }
}

fn task_to_reference(task: &UploadTask) -> FileReference {
    FileReference {
        file_name: task.file_name.clone(),
        file_type: task.file_type.clone(),
        file_size: task.file_size,
        file_path: task.file_path.clone().unwrap_or_default(),
    }
}
