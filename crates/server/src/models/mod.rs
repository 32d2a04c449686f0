mod file;
mod message;
mod user;

pub use file::*;
pub use message::*;
pub use user::*;

/// Identity resolved from the session token by the auth extractor.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
}
