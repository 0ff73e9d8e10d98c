//! PostgreSQL database storage implementation

mod queries;
mod schema;

use crate::{FileRecord, NewUser, Storage, StorageError, UserRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use queries::Queries;
use schema::Schema;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_INITIAL_DELAY_SECONDS: u64 = 1;

/// How hard to try reaching the database at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseRetryConfig {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure
    pub initial_delay_seconds: u64,
}

impl Default for DatabaseRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_seconds: DEFAULT_INITIAL_DELAY_SECONDS,
        }
    }
}

impl DatabaseRetryConfig {
    /// Read `DB_MAX_RETRY_ATTEMPTS` and `DB_INITIAL_RETRY_DELAY_SECONDS`,
    /// falling back to defaults for missing or unparsable values
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_attempts = std::env::var("DB_MAX_RETRY_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n: &u32| *n > 0)
            .unwrap_or(defaults.max_attempts);
        let initial_delay_seconds = std::env::var("DB_INITIAL_RETRY_DELAY_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.initial_delay_seconds);
        Self {
            max_attempts,
            initial_delay_seconds,
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_secs(self.initial_delay_seconds.saturating_mul(factor))
    }
}

/// PostgreSQL database storage implementation
pub struct DatabaseStorage {
    pool: PgPool,
}

impl DatabaseStorage {
    /// Connect (with retries) and make sure the schema exists
    pub async fn new(database_url: &str, retry_config: DatabaseRetryConfig) -> Result<Self> {
        let pool = Self::connect_with_retry(database_url, retry_config).await?;
        Schema::initialize(&pool).await?;
        Ok(Self { pool })
    }

    async fn connect_with_retry(
        database_url: &str,
        retry_config: DatabaseRetryConfig,
    ) -> Result<PgPool> {
        let mut attempt = 1;
        loop {
            match PgPool::connect(database_url).await {
                Ok(pool) => {
                    info!("Connected to PostgreSQL on attempt {}", attempt);
                    return Ok(pool);
                }
                Err(e) if attempt < retry_config.max_attempts => {
                    let delay = retry_config.delay_after(attempt);
                    warn!(
                        "Database connection attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt, retry_config.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!(
                            "Failed to connect to PostgreSQL database after {} attempts",
                            attempt
                        )
                    });
                }
            }
        }
    }
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord> {
        Queries::insert_user(&self.pool, &user)
            .await?
            .ok_or_else(|| StorageError::EmailTaken(user.email.clone()).into())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Queries::find_user_by_email(&self.pool, email).await
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<UserRecord>> {
        Queries::get_user(&self.pool, user_id).await
    }

    async fn mark_user_verified(&self, user_id: i64) -> Result<bool> {
        Queries::mark_user_verified(&self.pool, user_id).await
    }

    async fn store_file(
        &self,
        user_id: i64,
        filename: &str,
        content: &[u8],
    ) -> Result<FileRecord> {
        Queries::insert_file(&self.pool, user_id, filename, content).await
    }

    async fn list_files(&self) -> Result<Vec<FileRecord>> {
        Queries::list_files(&self.pool).await
    }

    async fn get_file(&self, file_id: i64) -> Result<Option<FileRecord>> {
        Queries::get_file(&self.pool, file_id).await
    }

    async fn read_file_content(&self, file_id: i64) -> Result<Vec<u8>> {
        Queries::read_file_content(&self.pool, file_id)
            .await?
            .ok_or_else(|| StorageError::FileNotFound(file_id).into())
    }

    async fn consume_token(&self, fingerprint: &str, retention: Duration) -> Result<bool> {
        Queries::delete_consumed_tokens_older_than(&self.pool, retention).await?;
        Queries::insert_consumed_token(&self.pool, fingerprint).await
    }
}
