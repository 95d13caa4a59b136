//! Domain service for password-reset tokens.

use thiserror::Error;

/// Errors specific to the reset flow.
#[derive(Debug, Error)]
pub enum ResetError {
    /// No user matches the supplied email; no token is created.
    #[error("No user found with that email")]
    UnknownEmail,

    /// Token absent, expired, or already consumed.
    #[error("Invalid or expired token")]
    InvalidOrExpired,

    /// The token was issued and persisted, but the mail could not be
    /// delivered. Callers may retry delivery without reissuing.
    #[error("Failed to deliver reset email: {0}")]
    Delivery(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ResetError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ResetError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A freshly issued token. The raw token is a bearer credential: it goes
/// into the mailed reset link and nowhere else.
#[derive(Debug, Clone)]
pub struct IssuedReset {
    pub token: String,
    pub expires_at: String,
}

#[async_trait::async_trait]
pub trait ResetService: Send + Sync {
    /// Full forgot-password flow: resolve the email to a user, issue a
    /// token, and mail the reset link.
    ///
    /// # Errors
    ///
    /// [`ResetError::UnknownEmail`] when no user matches (no token is
    /// created); [`ResetError::Delivery`] when the token was persisted but
    /// the mail failed.
    async fn forgot_password(&self, email: &str) -> Result<(), ResetError>;

    /// Generate and persist a token for a user. The token is only returned
    /// once it is durably stored.
    async fn issue(&self, user_id: i32) -> Result<IssuedReset, ResetError>;

    /// Consume a token: atomically update the owning user's password and
    /// delete the token. At most one consumption per token ever succeeds.
    async fn consume(&self, token: &str, new_password: &str) -> Result<(), ResetError>;
}
