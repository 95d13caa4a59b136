//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::entities::users::Role;
use crate::services::auth_service::{AuthError, AuthService, UserInfo};
use async_trait::async_trait;

const MIN_PASSWORD_LEN: usize = 8;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn validate_new_password(password: &str) -> Result<(), AuthError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .verify_credentials(username, password, &self.security)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(UserInfo::from(user))
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<UserInfo, AuthError> {
        if username.is_empty() || email.is_empty() {
            return Err(AuthError::Validation(
                "Username and email are required".to_string(),
            ));
        }
        Self::validate_new_password(password)?;

        self.create_user(username, password, Role::User, Some(email))
            .await
    }

    async fn create_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
        email: Option<&str>,
    ) -> Result<UserInfo, AuthError> {
        if username.is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        Self::validate_new_password(password)?;

        let user = self
            .store
            .create_user(username, password, role, email, &self.security)
            .await?
            .ok_or(AuthError::DuplicateUsername)?;

        Ok(UserInfo::from(user))
    }

    async fn get_user(&self, user_id: i32) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserInfo::from(user))
    }

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        Self::validate_new_password(new_password)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        // Re-verify the current password before updating
        let verified = self
            .store
            .verify_credentials(&user.username, current_password, &self.security)
            .await?;

        if verified.is_none() {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(user_id, new_password, &self.security)
            .await?;

        Ok(())
    }
}
