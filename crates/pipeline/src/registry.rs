//! Token registry access.
//!
//! The registry holds at most one device token per user. This subsystem
//! reads it to resolve recipients and mutates it only to clear tokens that
//! failed delivery. Clears are single-field, idempotent writes keyed by
//! exact match, so no transaction is needed even under concurrent cleanup.

use async_trait::async_trait;
use sqlx::PgPool;

use courier_common::error::AppError;
use courier_common::types::TokenOwner;

/// Token registry collaborator interface.
#[async_trait]
pub trait TokenRegistry: Send + Sync {
    /// All users currently holding a device token, ordered by user id so
    /// that batching is deterministic within one invocation.
    async fn users_with_tokens(&self) -> Result<Vec<TokenOwner>, AppError>;

    /// Users whose registered token equals `token`. Zero or more matches.
    async fn users_holding_token(&self, token: &str) -> Result<Vec<String>, AppError>;

    /// Clear the token field on a user's record. Clearing an already-empty
    /// field is a no-op, not an error.
    async fn clear_token(&self, user_id: &str) -> Result<(), AppError>;
}

/// Postgres-backed registry over the `device_tokens` table.
pub struct PgTokenRegistry {
    pool: PgPool,
}

impl PgTokenRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRegistry for PgTokenRegistry {
    async fn users_with_tokens(&self) -> Result<Vec<TokenOwner>, AppError> {
        let owners: Vec<TokenOwner> = sqlx::query_as(
            r#"
            SELECT user_id, token
            FROM device_tokens
            WHERE token IS NOT NULL
            ORDER BY user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(owners)
    }

    async fn users_holding_token(&self, token: &str) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT user_id FROM device_tokens WHERE token = $1")
                .bind(token)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(user_id,)| user_id).collect())
    }

    async fn clear_token(&self, user_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE device_tokens SET token = NULL, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(user_id, "Cleared stale device token");
        Ok(())
    }
}
