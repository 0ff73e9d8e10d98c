use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

/// Database schema manager
pub struct Schema;

impl Schema {
    /// Initialize all database tables and indexes
    pub async fn initialize(pool: &PgPool) -> Result<()> {
        Self::create_users_table(pool).await?;
        Self::create_files_table(pool).await?;
        Self::create_consumed_tokens_table(pool).await?;
        Self::create_indexes(pool).await?;
        info!("PostgreSQL database storage initialized");
        Ok(())
    }

    async fn create_users_table(pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                username VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                is_verified BOOLEAN NOT NULL DEFAULT FALSE,
                is_ops BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create users table")?;
        Ok(())
    }

    async fn create_files_table(pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                id BIGSERIAL PRIMARY KEY,
                filename VARCHAR(255) NOT NULL,
                user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content BYTEA NOT NULL,
                uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create files table")?;
        Ok(())
    }

    /// Fingerprints of single-use links that were already redeemed
    async fn create_consumed_tokens_table(pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS consumed_tokens (
                fingerprint VARCHAR(64) PRIMARY KEY,
                consumed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create consumed_tokens table")?;
        Ok(())
    }

    async fn create_indexes(pool: &PgPool) -> Result<()> {
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_user ON files(user_id)")
            .execute(pool)
            .await
            .context("Failed to create files index")?;
        Ok(())
    }
}
