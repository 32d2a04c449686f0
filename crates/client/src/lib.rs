//! Headless client state for the chat assistant: the upload lifecycle, the
//! toast notification queue, and optimistic history synchronization against
//! the server's append endpoint. No rendering lives here; a UI layer reads
//! the controllers' snapshots and calls their operations.

pub mod api;
pub mod sync;
pub mod toast;
pub mod types;
pub mod upload;
