//! Account service repositories

pub mod user;

// Re-export for convenience
pub use user::{MAX_TOKEN_ATTEMPTS, UserRepository};
