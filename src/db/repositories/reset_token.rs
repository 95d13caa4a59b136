use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::entities::pw_reset_tokens;
use crate::entities::users;

/// Result of a consume attempt. `InvalidOrExpired` covers every failure
/// mode: unknown token, expired token, and a token already claimed by a
/// concurrent consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Consumed { user_id: i32 },
    InvalidOrExpired,
}

pub struct ResetTokenRepository {
    conn: DatabaseConnection,
}

impl ResetTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Persist a new token for a user. The token is only link-worthy once
    /// this returns; the caller must not hand out the value beforehand.
    ///
    /// Older tokens for the same user are left in place: multiple
    /// outstanding tokens may coexist until consumed or expired.
    pub async fn insert(&self, user_id: i32, token: &str, expires_at: &str) -> Result<()> {
        // Opportunistic sweep of expired rows; RFC 3339 UTC strings order
        // lexicographically.
        let now = chrono::Utc::now().to_rfc3339();
        pw_reset_tokens::Entity::delete_many()
            .filter(pw_reset_tokens::Column::ExpiresAt.lt(&now))
            .exec(&self.conn)
            .await
            .context("Failed to sweep expired reset tokens")?;

        let active = pw_reset_tokens::ActiveModel {
            user_id: Set(user_id),
            token: Set(token.to_string()),
            expires_at: Set(expires_at.to_string()),
            ..Default::default()
        };
        active
            .insert(&self.conn)
            .await
            .context("Failed to insert reset token")?;

        Ok(())
    }

    /// Atomically claim a token and install the new password hash.
    ///
    /// The claim is a conditional delete checked via rows-affected, issued
    /// as the transaction's first statement so concurrent consumers
    /// serialize on the write lock instead of deadlocking on a
    /// shared-to-reserved upgrade; exactly one gets a row. Password change
    /// and token deletion commit or roll back as a unit. The hash must be
    /// computed by the caller so no transaction is held open during the
    /// KDF.
    pub async fn consume(&self, token: &str, new_password_hash: &str) -> Result<ConsumeOutcome> {
        // Locate the row outside the write transaction. This read only
        // discriminates unknown from expired; the conditional delete below
        // is what decides ownership.
        let Some(row) = pw_reset_tokens::Entity::find()
            .filter(pw_reset_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to look up reset token")?
        else {
            return Ok(ConsumeOutcome::InvalidOrExpired);
        };

        let now = chrono::Utc::now().to_rfc3339();
        if row.expires_at < now {
            // Expired rows are deleted on sight; replay then hits the
            // unknown-token path.
            pw_reset_tokens::Entity::delete_by_id(row.id)
                .exec(&self.conn)
                .await?;
            return Ok(ConsumeOutcome::InvalidOrExpired);
        }

        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin reset-token transaction")?;

        let claimed = pw_reset_tokens::Entity::delete_many()
            .filter(pw_reset_tokens::Column::Id.eq(row.id))
            .filter(pw_reset_tokens::Column::ExpiresAt.gt(now))
            .exec(&txn)
            .await
            .context("Failed to claim reset token")?;
        if claimed.rows_affected == 0 {
            txn.rollback().await.ok();
            return Ok(ConsumeOutcome::InvalidOrExpired);
        }

        let user = users::Entity::find_by_id(row.user_id)
            .one(&txn)
            .await
            .context("Failed to load reset token owner")?
            .ok_or_else(|| anyhow::anyhow!("Reset token references missing user {}", row.user_id))?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_password_hash.to_string());
        active.must_change_password = Set(false);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&txn).await?;

        txn.commit()
            .await
            .context("Failed to commit reset-token transaction")?;

        Ok(ConsumeOutcome::Consumed { user_id: row.user_id })
    }

    /// Count outstanding tokens for a user. Test/diagnostic helper.
    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        use sea_orm::PaginatorTrait;

        let count = pw_reset_tokens::Entity::find()
            .filter(pw_reset_tokens::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count reset tokens")?;

        Ok(count)
    }
}

/// Generate a reset token: 32 random bytes hex-encoded, 256 bits of
/// entropy from the thread-local CSPRNG.
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
