//! Domain service for authentication and user management.
//!
//! Handles credential verification, registration, and password changes.

use serde::Serialize;
use thiserror::Error;

use crate::entities::users::Role;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Covers both unknown username and wrong password; callers must not
    /// be able to tell the two apart.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// User info DTO for responses. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub email: Option<String>,
    pub must_change_password: bool,
}

impl From<crate::db::User> for UserInfo {
    fn from(user: crate::db::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            email: user.email,
            must_change_password: user.must_change_password,
        }
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and returns user info.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<UserInfo, AuthError>;

    /// Self-service registration; the role is always [`Role::User`].
    async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<UserInfo, AuthError>;

    /// Admin user creation with an explicit role.
    async fn create_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
        email: Option<&str>,
    ) -> Result<UserInfo, AuthError>;

    /// Loads a user by id, e.g. for session resolution.
    async fn get_user(&self, user_id: i32) -> Result<UserInfo, AuthError>;

    /// Changes a user's password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if current password is incorrect or new password invalid.
    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}
