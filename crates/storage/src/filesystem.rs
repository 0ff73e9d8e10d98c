//! Filesystem-based storage implementation
//!
//! Layout under the data directory:
//! - `records.json`: users, file metadata and consumed token fingerprints
//! - `records.lock`: exclusive lock held while records are rewritten
//! - `files/<file_id>/<filename>`: document bytes

mod records;

use crate::{FileRecord, NewUser, Storage, StorageError, UserRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use records::Records;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

const RECORDS_FILE: &str = "records.json";
const LOCK_FILE: &str = "records.lock";
const FILES_DIR: &str = "files";

/// Filesystem-based storage implementation
pub struct FilesystemStorage {
    data_dir: PathBuf,
    // Serializes read-modify-write cycles inside this process; the file lock
    // covers other processes sharing the directory
    write_lock: Mutex<()>,
}

/// Holds the exclusive lock on `records.lock` until dropped
struct RecordsLock(File);

impl Drop for RecordsLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

impl FilesystemStorage {
    /// Open (creating if needed) a data directory
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(data_dir.join(FILES_DIR))
            .await
            .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;
        info!("Filesystem storage ready at {:?}", data_dir);
        Ok(Self {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn records_path(&self) -> PathBuf {
        self.data_dir.join(RECORDS_FILE)
    }

    fn file_dir(&self, file_id: i64) -> PathBuf {
        self.data_dir.join(FILES_DIR).join(file_id.to_string())
    }

    async fn lock_records(&self) -> Result<RecordsLock> {
        let lock_path = self.data_dir.join(LOCK_FILE);
        tokio::task::spawn_blocking(move || lock_exclusive(&lock_path))
            .await
            .context("Records lock task failed")?
    }

    async fn load(&self) -> Result<Records> {
        Records::load_or_default(&self.records_path()).await
    }

    /// Run `f` against freshly loaded records and persist the result
    async fn update<T: Send>(
        &self,
        f: impl FnOnce(&mut Records) -> Result<T> + Send,
    ) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let _lock = self.lock_records().await?;
        let mut records = self.load().await?;
        let out = f(&mut records)?;
        records.save_atomic(&self.records_path()).await?;
        Ok(out)
    }
}

fn lock_exclusive(path: &Path) -> Result<RecordsLock> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open lock file: {:?}", path))?;
    file.lock_exclusive()
        .context("Failed to acquire records lock")?;
    Ok(RecordsLock(file))
}

#[async_trait]
impl Storage for FilesystemStorage {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord> {
        self.update(move |records| {
            if records.user_by_email(&user.email).is_some() {
                return Err(StorageError::EmailTaken(user.email).into());
            }
            let record = UserRecord {
                id: records.next_user_id(),
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                is_verified: false,
                is_ops: user.is_ops,
                created_at: Utc::now(),
            };
            records.users.push(record.clone());
            Ok(record)
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.load().await?.user_by_email(email).cloned())
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<UserRecord>> {
        Ok(self.load().await?.user(user_id).cloned())
    }

    async fn mark_user_verified(&self, user_id: i64) -> Result<bool> {
        self.update(move |records| {
            match records.users.iter_mut().find(|u| u.id == user_id) {
                Some(user) => {
                    user.is_verified = true;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
        .await
    }

    async fn store_file(
        &self,
        user_id: i64,
        filename: &str,
        content: &[u8],
    ) -> Result<FileRecord> {
        let _guard = self.write_lock.lock().await;
        let _lock = self.lock_records().await?;
        let mut records = self.load().await?;

        let file_id = records.next_file_id();
        let file_dir = self.file_dir(file_id);
        tokio::fs::create_dir_all(&file_dir)
            .await
            .context("Failed to create file directory")?;
        tokio::fs::write(file_dir.join(filename), content)
            .await
            .context("Failed to write file")?;

        // Content is on disk before the record that points at it
        let record = FileRecord {
            id: file_id,
            filename: filename.to_string(),
            user_id,
            uploaded_at: Utc::now(),
        };
        records.files.push(record.clone());
        records.save_atomic(&self.records_path()).await?;
        Ok(record)
    }

    async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let mut files = self.load().await?.files;
        files.sort_by_key(|f| f.id);
        Ok(files)
    }

    async fn get_file(&self, file_id: i64) -> Result<Option<FileRecord>> {
        Ok(self.load().await?.file(file_id).cloned())
    }

    async fn read_file_content(&self, file_id: i64) -> Result<Vec<u8>> {
        let records = self.load().await?;
        let file = records
            .file(file_id)
            .ok_or(StorageError::FileNotFound(file_id))?;
        let path = self.file_dir(file_id).join(&file.filename);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read file: {:?}", path))
    }

    async fn consume_token(&self, fingerprint: &str, retention: Duration) -> Result<bool> {
        let fingerprint = fingerprint.to_string();
        let cutoff = chrono::Duration::from_std(retention)
            .ok()
            .and_then(|retention| Utc::now().checked_sub_signed(retention));
        self.update(move |records| {
            if let Some(cutoff) = cutoff {
                records.prune_consumed_tokens(cutoff);
            }
            if records.consumed_tokens.contains_key(&fingerprint) {
                return Ok(false);
            }
            records.consumed_tokens.insert(fingerprint, Utc::now());
            Ok(true)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RETENTION: Duration = Duration::from_secs(3600);

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("storage-test-{}", uuid::Uuid::new_v4()))
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: email.to_string(),
            password_hash: "$2b$12$hash".to_string(),
            is_ops: false,
        }
    }

    #[tokio::test]
    async fn test_users_round_trip_and_unique_email() {
        let dir = temp_dir();
        let storage = FilesystemStorage::open(&dir).await.unwrap();

        let alice = storage.create_user(new_user("a@example.com")).await.unwrap();
        let bob = storage.create_user(new_user("b@example.com")).await.unwrap();
        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
        assert!(!alice.is_verified);

        let err = storage
            .create_user(new_user("a@example.com"))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<StorageError>(),
            Some(&StorageError::EmailTaken("a@example.com".to_string()))
        );

        let found = storage
            .find_user_by_email("b@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, bob);
        assert!(storage.get_user(99).await.unwrap().is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_mark_verified() {
        let dir = temp_dir();
        let storage = FilesystemStorage::open(&dir).await.unwrap();
        let user = storage.create_user(new_user("v@example.com")).await.unwrap();

        assert!(storage.mark_user_verified(user.id).await.unwrap());
        assert!(storage.get_user(user.id).await.unwrap().unwrap().is_verified);
        assert!(!storage.mark_user_verified(404).await.unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_files_persist_across_reopen() {
        let dir = temp_dir();
        {
            let storage = FilesystemStorage::open(&dir).await.unwrap();
            let first = storage.store_file(1, "plan.docx", b"one").await.unwrap();
            let second = storage.store_file(1, "plan.docx", b"two").await.unwrap();
            assert_ne!(first.id, second.id);
        }

        let storage = FilesystemStorage::open(&dir).await.unwrap();
        let files = storage.list_files().await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "plan.docx");
        assert_eq!(storage.read_file_content(files[0].id).await.unwrap(), b"one");
        assert_eq!(storage.read_file_content(files[1].id).await.unwrap(), b"two");

        let err = storage.read_file_content(77).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<StorageError>(),
            Some(&StorageError::FileNotFound(77))
        );
        assert!(storage.get_file(77).await.unwrap().is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_consume_token_once() {
        let dir = temp_dir();
        let storage = FilesystemStorage::open(&dir).await.unwrap();

        assert!(storage.consume_token("abc", RETENTION).await.unwrap());
        assert!(!storage.consume_token("abc", RETENTION).await.unwrap());
        assert!(storage.consume_token("def", RETENTION).await.unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_concurrent_consumers_single_winner() {
        let dir = temp_dir();
        let storage = std::sync::Arc::new(FilesystemStorage::open(&dir).await.unwrap());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage.consume_token("shared", RETENTION).await.unwrap()
            }));
        }
        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_consume_token_forgets_expired_fingerprints() {
        let dir = temp_dir();
        let storage = FilesystemStorage::open(&dir).await.unwrap();

        assert!(storage.consume_token("stale", RETENTION).await.unwrap());
        storage
            .update(|records| {
                records
                    .consumed_tokens
                    .insert("stale".to_string(), Utc::now() - chrono::Duration::hours(2));
                Ok(())
            })
            .await
            .unwrap();

        assert!(storage.consume_token("fresh", RETENTION).await.unwrap());
        let records = storage.load().await.unwrap();
        assert!(!records.consumed_tokens.contains_key("stale"));
        assert!(records.consumed_tokens.contains_key("fresh"));
        assert_eq!(records.consumed_tokens.len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
