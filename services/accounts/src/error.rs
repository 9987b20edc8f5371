//! Error types for the account service

use thiserror::Error;

use crate::validation::FieldError;

/// Custom error type for account operations
#[derive(Error, Debug)]
pub enum AccountError {
    /// The record failed validation and was not persisted
    #[error("record invalid: {}", format_fields(.0))]
    Invalid(Vec<FieldError>),

    /// No unique session token could be found within the attempt budget
    #[error("could not allocate a unique session token after {0} attempts")]
    TokenSpaceExhausted(u32),

    /// The password hasher rejected its input
    #[error("password hashing error: {0}")]
    PasswordHash(String),

    /// Error occurred during database query execution
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AccountError {
    /// Field-level validation errors, when this is a record-invalid failure
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            Self::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

fn format_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Type alias for Result with AccountError
pub type AccountResult<T> = Result<T, AccountError>;
