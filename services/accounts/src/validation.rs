//! Input validation utilities

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::models::{NewUser, UpdateUser};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("is required".to_string());
    }

    Ok(())
}

/// Validate display name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("is required".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "must be at least {} characters long",
            MIN_PASSWORD_LEN
        ));
    }

    Ok(())
}

/// Validate an avatar upload content type; only images are accepted
pub fn validate_avatar_content_type(content_type: &str) -> Result<(), String> {
    static IMAGE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = IMAGE_REGEX
        .get_or_init(|| Regex::new(r"\Aimage/.*\z").expect("Failed to compile image type regex"));

    if !regex.is_match(content_type) {
        return Err("must be an image".to_string());
    }

    Ok(())
}

/// Validate a creation payload, collecting every field failure
pub fn validate_new_user(new_user: &NewUser) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Err(message) = validate_username(&new_user.username) {
        errors.push(FieldError::new("username", message));
    }

    if let Err(message) = validate_name(&new_user.name) {
        errors.push(FieldError::new("name", message));
    }

    if let Err(message) = validate_password(&new_user.password) {
        errors.push(FieldError::new("password", message));
    }

    errors
}

/// Validate an update payload; absent fields are left untouched
pub fn validate_update(update: &UpdateUser) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(name) = &update.name {
        if let Err(message) = validate_name(name) {
            errors.push(FieldError::new("name", message));
        }
    }

    if let Some(password) = &update.password {
        if let Err(message) = validate_password(password) {
            errors.push(FieldError::new("password", message));
        }
    }

    errors
}
