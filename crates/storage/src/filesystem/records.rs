use crate::{FileRecord, UserRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Everything the filesystem backend knows apart from document bytes
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct Records {
    pub last_user_id: i64,
    pub last_file_id: i64,
    pub users: Vec<UserRecord>,
    pub files: Vec<FileRecord>,
    /// token fingerprint -> time it was redeemed
    pub consumed_tokens: BTreeMap<String, DateTime<Utc>>,
}

impl Records {
    /// Load records, or start empty when the file does not exist yet
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .context("Failed to read records")?;
        serde_json::from_str(&content).context("Failed to parse records")
    }

    /// Write to a sibling temp file, fsync, then rename over the original
    pub async fn save_atomic(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize records")?;
        let tmp_path = path.with_extension("json.tmp");

        let mut file = tokio::fs::File::create(&tmp_path)
            .await
            .context("Failed to create temporary records file")?;
        file.write_all(json.as_bytes())
            .await
            .context("Failed to write records")?;
        file.sync_all()
            .await
            .context("Failed to sync records file to disk")?;
        drop(file);

        tokio::fs::rename(&tmp_path, path)
            .await
            .context("Failed to replace records file")?;
        Ok(())
    }

    pub fn next_user_id(&mut self) -> i64 {
        self.last_user_id += 1;
        self.last_user_id
    }

    pub fn next_file_id(&mut self) -> i64 {
        self.last_file_id += 1;
        self.last_file_id
    }

    pub fn user_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.email == email)
    }

    pub fn user(&self, user_id: i64) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.id == user_id)
    }

    pub fn file(&self, file_id: i64) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == file_id)
    }

    /// Forget fingerprints redeemed at or before `cutoff`
    pub fn prune_consumed_tokens(&mut self, cutoff: DateTime<Utc>) {
        self.consumed_tokens.retain(|_, consumed_at| *consumed_at > cutoff);
    }
}
