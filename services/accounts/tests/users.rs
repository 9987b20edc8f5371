//! End-to-end tests for the user repository
//!
//! Each test runs against its own in-memory SQLite database with the schema
//! migrations applied, so the suite is hermetic and order-independent.

use accounts::error::AccountError;
use accounts::models::{AvatarUpload, DEFAULT_AVATAR_URL, LoginCredentials, NewUser, UpdateUser};
use accounts::repositories::{MAX_TOKEN_ATTEMPTS, UserRepository};
use anyhow::Result;
use common::database::DatabaseConfig;

async fn repo() -> UserRepository {
    common::telemetry::init_tracing();

    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };

    UserRepository::connect(&config)
        .await
        .expect("in-memory repository")
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        name: "Ursula K. Le Guin".to_string(),
        password: "earthsea-cycle".to_string(),
    }
}

fn credentials(username: &str, password: &str) -> LoginCredentials {
    LoginCredentials {
        username: username.to_string(),
        password: password.to_string(),
    }
}

fn field_of(err: &AccountError) -> &str {
    err.field_errors()
        .and_then(|errors| errors.first())
        .map(|e| e.field)
        .unwrap_or("")
}

#[tokio::test]
async fn test_create_then_find_by_credentials() -> Result<()> {
    let repo = repo().await;

    let created = repo.create(&new_user("ursula")).await?;
    assert_ne!(created.password_hash, "earthsea-cycle");

    let found = repo
        .find_by_credentials(&credentials("ursula", "earthsea-cycle"))
        .await?
        .expect("credentials should match");

    assert_eq!(found.id, created.id);
    assert_eq!(found.username, "ursula");
    assert_eq!(found.name, "Ursula K. Le Guin");
    Ok(())
}

#[tokio::test]
async fn test_wrong_password_finds_nothing() -> Result<()> {
    let repo = repo().await;
    repo.create(&new_user("ursula")).await?;

    let found = repo
        .find_by_credentials(&credentials("ursula", "wrong-password"))
        .await?;

    assert!(found.is_none());
    Ok(())
}

#[tokio::test]
async fn test_unknown_username_finds_nothing() -> Result<()> {
    let repo = repo().await;
    repo.create(&new_user("ursula")).await?;

    let found = repo
        .find_by_credentials(&credentials("nobody", "earthsea-cycle"))
        .await?;

    assert!(found.is_none());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_username_is_record_invalid() -> Result<()> {
    let repo = repo().await;
    repo.create(&new_user("ursula")).await?;

    let err = repo
        .create(&new_user("ursula"))
        .await
        .expect_err("second save must fail validation");

    assert_eq!(field_of(&err), "username");
    Ok(())
}

#[tokio::test]
async fn test_password_length_boundary() -> Result<()> {
    let repo = repo().await;

    let mut short = new_user("ursula");
    short.password = "12345".to_string();
    let err = repo.create(&short).await.expect_err("five characters");
    assert_eq!(field_of(&err), "password");

    let mut exact = new_user("ursula");
    exact.password = "123456".to_string();
    assert!(repo.create(&exact).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn test_missing_required_fields_collect_errors() -> Result<()> {
    let repo = repo().await;

    let invalid = NewUser {
        username: "".to_string(),
        name: "".to_string(),
        password: "earthsea-cycle".to_string(),
    };

    let err = repo.create(&invalid).await.expect_err("blank fields");
    let fields: Vec<_> = err
        .field_errors()
        .expect("record-invalid result")
        .iter()
        .map(|e| e.field)
        .collect();

    assert_eq!(fields, vec!["username", "name"]);
    Ok(())
}

#[tokio::test]
async fn test_fresh_user_has_session_token() -> Result<()> {
    let repo = repo().await;

    let created = repo.create(&new_user("ursula")).await?;

    assert!(!created.session_token.is_empty());
    let stored = repo.find_by_id(created.id).await?.expect("stored user");
    assert_eq!(stored.session_token, created.session_token);
    Ok(())
}

#[tokio::test]
async fn test_reset_session_token_rotates_and_persists() -> Result<()> {
    let repo = repo().await;
    let created = repo.create(&new_user("ursula")).await?;

    let rotated = repo.reset_session_token(created.id).await?;

    assert_ne!(rotated, created.session_token);
    let stored = repo.find_by_id(created.id).await?.expect("stored user");
    assert_eq!(stored.session_token, rotated);
    Ok(())
}

#[tokio::test]
async fn test_reset_session_token_for_unknown_user_errors() {
    let repo = repo().await;

    let err = repo
        .reset_session_token(uuid::Uuid::new_v4())
        .await
        .expect_err("no such user");

    assert!(matches!(err, AccountError::Database(_)));
}

#[tokio::test]
async fn test_forced_collision_regenerates() -> Result<()> {
    let repo = repo().await;
    let created = repo.create(&new_user("ursula")).await?;

    let mut candidates = vec![created.session_token.clone(), "fresh-token".to_string()].into_iter();
    let token = repo
        .generate_session_token(move || candidates.next().expect("two candidates"))
        .await?;

    assert_eq!(token, "fresh-token");
    Ok(())
}

#[tokio::test]
async fn test_exhausted_token_generator_errors() -> Result<()> {
    let repo = repo().await;
    let created = repo.create(&new_user("ursula")).await?;

    let taken = created.session_token.clone();
    let err = repo
        .generate_session_token(move || taken.clone())
        .await
        .expect_err("every candidate collides");

    assert!(matches!(
        err,
        AccountError::TokenSpaceExhausted(MAX_TOKEN_ATTEMPTS)
    ));
    Ok(())
}

#[tokio::test]
async fn test_session_token_in_use() -> Result<()> {
    let repo = repo().await;
    let created = repo.create(&new_user("ursula")).await?;

    assert!(repo.session_token_in_use(&created.session_token).await?);
    assert!(!repo.session_token_in_use("nobody-holds-this").await?);
    Ok(())
}

#[tokio::test]
async fn test_update_without_password_keeps_credentials() -> Result<()> {
    let repo = repo().await;
    let created = repo.create(&new_user("ursula")).await?;

    let update = UpdateUser {
        name: Some("U. K. Le Guin".to_string()),
        password: None,
    };
    let updated = repo.update(created.id, &update).await?;
    assert_eq!(updated.name, "U. K. Le Guin");

    let found = repo
        .find_by_credentials(&credentials("ursula", "earthsea-cycle"))
        .await?;
    assert!(found.is_some(), "old password must keep working");
    Ok(())
}

#[tokio::test]
async fn test_update_password_changes_credentials() -> Result<()> {
    let repo = repo().await;
    let created = repo.create(&new_user("ursula")).await?;

    let update = UpdateUser {
        name: None,
        password: Some("the-dispossessed".to_string()),
    };
    repo.update(created.id, &update).await?;

    let old = repo
        .find_by_credentials(&credentials("ursula", "earthsea-cycle"))
        .await?;
    assert!(old.is_none());

    let new = repo
        .find_by_credentials(&credentials("ursula", "the-dispossessed"))
        .await?;
    assert!(new.is_some());
    Ok(())
}

#[tokio::test]
async fn test_update_rejects_short_password() -> Result<()> {
    let repo = repo().await;
    let created = repo.create(&new_user("ursula")).await?;

    let update = UpdateUser {
        name: None,
        password: Some("short".to_string()),
    };
    let err = repo.update(created.id, &update).await.expect_err("too short");

    assert_eq!(field_of(&err), "password");
    Ok(())
}

#[tokio::test]
async fn test_avatar_defaults_to_placeholder() -> Result<()> {
    let repo = repo().await;
    let created = repo.create(&new_user("ursula")).await?;

    assert_eq!(created.avatar_or_default(), DEFAULT_AVATAR_URL);
    Ok(())
}

#[tokio::test]
async fn test_avatar_rejects_non_image_content() -> Result<()> {
    let repo = repo().await;
    let created = repo.create(&new_user("ursula")).await?;

    let upload = AvatarUpload {
        url: "https://cdn.example/avatars/u.pdf".to_string(),
        content_type: "application/pdf".to_string(),
    };
    let err = repo.set_avatar(created.id, &upload).await.expect_err("not an image");

    assert_eq!(field_of(&err), "avatar");
    Ok(())
}

#[tokio::test]
async fn test_avatar_accepts_image_upload() -> Result<()> {
    let repo = repo().await;
    let created = repo.create(&new_user("ursula")).await?;

    let upload = AvatarUpload {
        url: "https://cdn.example/avatars/u.png".to_string(),
        content_type: "image/png".to_string(),
    };
    let updated = repo.set_avatar(created.id, &upload).await?;

    assert_eq!(updated.avatar_or_default(), "https://cdn.example/avatars/u.png");
    let stored = repo.find_by_id(created.id).await?.expect("stored user");
    assert_eq!(stored.avatar_url.as_deref(), Some("https://cdn.example/avatars/u.png"));
    Ok(())
}
