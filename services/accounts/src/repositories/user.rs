//! User repository for database operations

use chrono::Utc;
use common::database::{self, DatabaseConfig};
use common::error::DatabaseResult;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::{AccountError, AccountResult};
use crate::models::{AvatarUpload, LoginCredentials, NewUser, UpdateUser, User};
use crate::validation::{FieldError, validate_avatar_content_type, validate_new_user, validate_update};
use crate::{password, token};

/// Retry budget for the unique-token loop; exhaustion is a terminal error
/// rather than an unbounded spin
pub const MAX_TOKEN_ATTEMPTS: u32 = 8;

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool from configuration, apply migrations, and wrap it
    pub async fn connect(config: &DatabaseConfig) -> DatabaseResult<Self> {
        let pool = database::init_pool(config).await?;
        crate::run_migrations(&pool).await?;

        Ok(Self::new(pool))
    }

    /// Create a new user
    ///
    /// Runs the validation pipeline, hashes the password, and assigns a fresh
    /// unique session token before touching the table. A taken username
    /// surfaces as a record-invalid error, not a database error.
    pub async fn create(&self, new_user: &NewUser) -> AccountResult<User> {
        info!("Creating new user: {}", new_user.username);

        let mut errors = validate_new_user(new_user);

        if errors.is_empty() && self.find_by_username(&new_user.username).await?.is_some() {
            errors.push(FieldError::new("username", "is already taken"));
        }

        if !errors.is_empty() {
            return Err(AccountError::Invalid(errors));
        }

        let password_hash = password::hash(&new_user.password)?;
        let session_token = self.generate_session_token(token::new_session_token).await?;

        let now = Utc::now();

        let row = sqlx::query(
            r#"
            INSERT INTO users (id, username, name, password_hash, session_token, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, username, name, password_hash, session_token, avatar_url, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.name)
        .bind(&password_hash)
        .bind(&session_token)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_violation)?;

        Ok(user_from_row(&row))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> AccountResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, name, password_hash, session_token, avatar_url, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| user_from_row(&row)))
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> AccountResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, name, password_hash, session_token, avatar_url, created_at, updated_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| user_from_row(&row)))
    }

    /// Look up a user by username and verify the candidate password
    ///
    /// An unknown username and a wrong password are both `Ok(None)`; callers
    /// cannot tell the two apart. No side effects.
    pub async fn find_by_credentials(
        &self,
        credentials: &LoginCredentials,
    ) -> AccountResult<Option<User>> {
        info!("Verifying credentials for user: {}", credentials.username);

        let Some(user) = self.find_by_username(&credentials.username).await? else {
            return Ok(None);
        };

        if self.verify_password(&user, &credentials.password)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Verify a user's password
    pub fn verify_password(&self, user: &User, password: &str) -> AccountResult<bool> {
        password::verify(password, &user.password_hash)
    }

    /// Rotate a user's session token, persisting immediately
    ///
    /// Returns the new token value.
    pub async fn reset_session_token(&self, id: Uuid) -> AccountResult<String> {
        info!("Rotating session token for user: {}", id);

        let session_token = self.generate_session_token(token::new_session_token).await?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users
            SET session_token = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&session_token)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_constraint_violation)?;

        if result.rows_affected() == 0 {
            return Err(AccountError::Database(sqlx::Error::RowNotFound));
        }

        Ok(session_token)
    }

    /// Update a user's name and/or password
    ///
    /// Absent fields keep their stored value; in particular an update without
    /// a password never touches the stored hash.
    pub async fn update(&self, id: Uuid, update: &UpdateUser) -> AccountResult<User> {
        info!("Updating user: {}", id);

        let errors = validate_update(update);
        if !errors.is_empty() {
            return Err(AccountError::Invalid(errors));
        }

        let password_hash = match &update.password {
            Some(password) => Some(password::hash(password)?),
            None => None,
        };

        let now = Utc::now();

        let row = sqlx::query(
            r#"
            UPDATE users
            SET name = coalesce(?, name),
                password_hash = coalesce(?, password_hash),
                updated_at = ?
            WHERE id = ?
            RETURNING id, username, name, password_hash, session_token, avatar_url, created_at, updated_at
            "#,
        )
        .bind(&update.name)
        .bind(&password_hash)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| user_from_row(&row))
            .ok_or(AccountError::Database(sqlx::Error::RowNotFound))
    }

    /// Attach an uploaded avatar image reference to a user
    ///
    /// The blob lives in external attachment storage; only image content
    /// types are accepted here.
    pub async fn set_avatar(&self, id: Uuid, upload: &AvatarUpload) -> AccountResult<User> {
        info!("Attaching avatar for user: {}", id);

        if let Err(message) = validate_avatar_content_type(&upload.content_type) {
            return Err(AccountError::Invalid(vec![FieldError::new("avatar", message)]));
        }

        let now = Utc::now();

        let row = sqlx::query(
            r#"
            UPDATE users
            SET avatar_url = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, username, name, password_hash, session_token, avatar_url, created_at, updated_at
            "#,
        )
        .bind(&upload.url)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| user_from_row(&row))
            .ok_or(AccountError::Database(sqlx::Error::RowNotFound))
    }

    /// Draw token candidates until one is unused, up to [`MAX_TOKEN_ATTEMPTS`]
    ///
    /// The generator is injectable so tests can force collisions; production
    /// callers pass [`token::new_session_token`].
    pub async fn generate_session_token(
        &self,
        mut next_token: impl FnMut() -> String,
    ) -> AccountResult<String> {
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let candidate = next_token();
            if !self.session_token_in_use(&candidate).await? {
                return Ok(candidate);
            }
        }

        Err(AccountError::TokenSpaceExhausted(MAX_TOKEN_ATTEMPTS))
    }

    /// Check whether any stored user already holds the given session token
    pub async fn session_token_in_use(&self, session_token: &str) -> AccountResult<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE session_token = ?")
            .bind(session_token)
            .fetch_one(&self.pool)
            .await?;

        let n: i64 = row.get("n");
        Ok(n > 0)
    }
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        session_token: row.get("session_token"),
        avatar_url: row.get("avatar_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Map a storage-level UNIQUE violation back into the record-invalid shape
///
/// Backstop for the check-then-act window between the uniqueness query and
/// the write.
fn map_constraint_violation(e: sqlx::Error) -> AccountError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            let field = if db_err.message().contains("users.session_token") {
                "session_token"
            } else {
                "username"
            };
            return AccountError::Invalid(vec![FieldError::new(field, "is already taken")]);
        }
    }

    AccountError::Database(e)
}
