//! Account service models

pub mod user;

// Re-export for convenience
pub use user::{AvatarUpload, DEFAULT_AVATAR_URL, LoginCredentials, NewUser, UpdateUser, User};
