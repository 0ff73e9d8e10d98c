pub mod backend;
pub mod database;
pub mod filesystem;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use backend::StorageBackend;
pub use database::{DatabaseRetryConfig, DatabaseStorage};
pub use filesystem::FilesystemStorage;

/// Errors callers are expected to tell apart; recover them with
/// `anyhow::Error::downcast_ref::<StorageError>()`
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Email {0} is already registered")]
    EmailTaken(String),
    #[error("File {0} not found")]
    FileNotFound(i64),
}

/// A registered account
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub is_ops: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating an account
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_ops: bool,
}

/// Metadata of an uploaded document; content is read separately
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FileRecord {
    pub id: i64,
    pub filename: String,
    pub user_id: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// Storage backend trait for users, documents and consumed link tokens
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create a user; fails with `StorageError::EmailTaken` on a duplicate email
    async fn create_user(&self, user: NewUser) -> Result<UserRecord>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn get_user(&self, user_id: i64) -> Result<Option<UserRecord>>;

    /// Flag a user as verified. Returns false when the user does not exist
    async fn mark_user_verified(&self, user_id: i64) -> Result<bool>;

    /// Store a document and its metadata together
    async fn store_file(&self, user_id: i64, filename: &str, content: &[u8])
        -> Result<FileRecord>;

    /// All documents ordered by id
    async fn list_files(&self) -> Result<Vec<FileRecord>>;

    async fn get_file(&self, file_id: i64) -> Result<Option<FileRecord>>;

    /// Read a document's bytes; fails with `StorageError::FileNotFound`
    async fn read_file_content(&self, file_id: i64) -> Result<Vec<u8>>;

    /// Atomically record a token fingerprint as used.
    /// Returns true only for the first caller. Fingerprints recorded more
    /// than `retention` ago are forgotten, since their tokens no longer verify
    async fn consume_token(&self, fingerprint: &str, retention: Duration) -> Result<bool>;
}
