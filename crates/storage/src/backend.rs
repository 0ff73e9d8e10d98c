use crate::{
    database::{DatabaseRetryConfig, DatabaseStorage},
    filesystem::FilesystemStorage,
    Storage,
};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Storage backend type
pub enum StorageBackend {
    /// Filesystem storage rooted at a data directory
    Filesystem(PathBuf),
    /// PostgreSQL storage
    Database {
        database_url: String,
        retry_config: Option<DatabaseRetryConfig>,
    },
}

impl StorageBackend {
    /// Initialize storage backend based on type
    pub async fn initialize(self) -> Result<Arc<dyn Storage>> {
        match self {
            StorageBackend::Filesystem(data_dir) => {
                let storage = FilesystemStorage::open(data_dir).await?;
                Ok(Arc::new(storage))
            }
            StorageBackend::Database {
                database_url,
                retry_config,
            } => {
                let storage =
                    DatabaseStorage::new(&database_url, retry_config.unwrap_or_default()).await?;
                Ok(Arc::new(storage))
            }
        }
    }
}
