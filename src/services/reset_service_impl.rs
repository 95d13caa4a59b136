//! `SeaORM` implementation of the `ResetService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task;
use tracing::{info, warn};

use crate::config::{MailConfig, SecurityConfig};
use crate::db::repositories::reset_token::generate_token;
use crate::db::repositories::user::hash_password;
use crate::db::{ConsumeOutcome, Store};
use crate::services::notifier::Notifier;
use crate::services::reset_service::{IssuedReset, ResetError, ResetService};

const MIN_PASSWORD_LEN: usize = 8;

pub struct SeaOrmResetService {
    store: Store,
    security: SecurityConfig,
    mail: MailConfig,
    notifier: Arc<dyn Notifier>,
}

impl SeaOrmResetService {
    #[must_use]
    pub fn new(
        store: Store,
        security: SecurityConfig,
        mail: MailConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            security,
            mail,
            notifier,
        }
    }

    /// Resolve a submitted email to a user account. Checks the account
    /// email first, then falls back to treating the email as a username
    /// (non-admin accounts conventionally sign in with their email).
    async fn resolve_user(&self, email: &str) -> Result<Option<crate::db::User>, ResetError> {
        if let Some(user) = self.store.get_user_by_email(email).await? {
            return Ok(Some(user));
        }
        Ok(self.store.get_user_by_username(email).await?)
    }

    fn reset_link(&self, token: &str) -> String {
        let base = self.mail.public_base_url.trim_end_matches('/');
        format!("{base}/reset-password/{token}")
    }
}

#[async_trait]
impl ResetService for SeaOrmResetService {
    async fn forgot_password(&self, email: &str) -> Result<(), ResetError> {
        let Some(user) = self.resolve_user(email).await? else {
            return Err(ResetError::UnknownEmail);
        };

        let issued = self.issue(user.id).await?;
        let link = self.reset_link(&issued.token);

        // Token issuance and delivery are decoupled: the token stays
        // persisted even when the mail bounces, and delivery can be
        // retried without reissuing.
        let body = format!("Click the link to reset your password: {link}");
        if let Err(e) = self.notifier.send(email, "Password reset", &body).await {
            warn!(user_id = user.id, "Reset email delivery failed: {e}");
            return Err(ResetError::Delivery(e.to_string()));
        }

        info!(user_id = user.id, "Password reset email sent");
        Ok(())
    }

    async fn issue(&self, user_id: i32) -> Result<IssuedReset, ResetError> {
        let token = generate_token();
        let ttl = chrono::Duration::hours(i64::from(self.security.reset_token_ttl_hours));
        let expires_at = (chrono::Utc::now() + ttl).to_rfc3339();

        // Persist before returning: a token is never link-worthy until it
        // is durably stored.
        self.store
            .insert_reset_token(user_id, &token, &expires_at)
            .await?;

        Ok(IssuedReset { token, expires_at })
    }

    async fn consume(&self, token: &str, new_password: &str) -> Result<(), ResetError> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(ResetError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        // Hash outside the consume transaction; the KDF is CPU-bound and
        // must not run while storage is locked.
        let password = new_password.to_string();
        let security = self.security.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .map_err(|e| ResetError::Internal(e.to_string()))??;

        match self.store.consume_reset_token(token, &new_hash).await? {
            ConsumeOutcome::Consumed { user_id } => {
                info!(user_id, "Password reset completed");
                Ok(())
            }
            ConsumeOutcome::InvalidOrExpired => Err(ResetError::InvalidOrExpired),
        }
    }
}
