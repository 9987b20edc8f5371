//! User accounts for the story-sharing platform
//!
//! This crate owns the `User` record: password authentication, session-token
//! issuance, field validation, and the attached avatar reference. Storage is
//! reached through the shared `common` pool; HTTP routing and attachment blob
//! storage belong to other services.

pub mod error;
pub mod models;
pub mod password;
pub mod repositories;
pub mod token;
pub mod validation;

pub use error::{AccountError, AccountResult};
pub use repositories::UserRepository;

/// Embedded schema migrations for the `users` table
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Apply pending migrations to the given pool
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
