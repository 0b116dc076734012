//! Domain service for authentication and user management.
//!
//! Handles registration, login, password changes, and role lookups.

use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;
use crate::models::{Role, User};

/// Longest accepted username.
pub const MAX_USERNAME_LEN: usize = 50;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConstraintViolation(_) => Self::DuplicateUsername,
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Password task failed: {err}"))
    }
}

/// User info DTO for responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub role: Role,
    pub created_at: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            username: user.username().to_string(),
            role: user.role(),
            created_at: user.created_at().to_string(),
        }
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DuplicateUsername`] if the name is taken, or
    /// [`AuthError::Validation`] for an empty/overlong username or short password.
    async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<UserInfo, AuthError>;

    /// Verifies credentials and returns user info.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown user and a
    /// wrong password alike.
    async fn login(&self, username: &str, password: &str) -> Result<UserInfo, AuthError>;

    /// Changes a user's password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the current password is
    /// wrong, or [`AuthError::Validation`] if the new one is too short.
    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    async fn get_user_role(&self, username: &str) -> Result<Option<Role>, AuthError>;

    async fn user_exists(&self, username: &str) -> Result<bool, AuthError>;

    /// Gets information for a specific user.
    async fn get_user_info(&self, username: &str) -> Result<UserInfo, AuthError>;
}
