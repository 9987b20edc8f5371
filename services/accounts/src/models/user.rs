//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Placeholder shown when a user has not uploaded an avatar
pub const DEFAULT_AVATAR_URL: &str = "default-avatar-img.png";

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub session_token: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The avatar URL to render, falling back to the default placeholder
    pub fn avatar_or_default(&self) -> &str {
        self.avatar_url.as_deref().unwrap_or(DEFAULT_AVATAR_URL)
    }
}

/// New user creation payload
///
/// The plaintext password only lives in this payload; the repository stores
/// its Argon2 hash and drops the payload at the end of the call.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub password: String,
}

/// User update payload
///
/// `password` may be omitted for updates that do not change it.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// User login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Reference to an uploaded avatar image
///
/// The image bytes themselves live in external attachment storage; only the
/// resulting URL is persisted here.
#[derive(Debug, Clone, Deserialize)]
pub struct AvatarUpload {
    pub url: String,
    pub content_type: String,
}
