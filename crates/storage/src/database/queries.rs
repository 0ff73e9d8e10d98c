use crate::{FileRecord, NewUser, UserRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;

type UserRow = (i64, String, String, String, bool, bool, DateTime<Utc>);
type FileRow = (i64, String, i64, DateTime<Utc>);

const USER_COLUMNS: &str = "id, username, email, password_hash, is_verified, is_ops, created_at";
const FILE_COLUMNS: &str = "id, filename, user_id, uploaded_at";

fn user_from_row(row: UserRow) -> UserRecord {
    let (id, username, email, password_hash, is_verified, is_ops, created_at) = row;
    UserRecord {
        id,
        username,
        email,
        password_hash,
        is_verified,
        is_ops,
        created_at,
    }
}

fn file_from_row(row: FileRow) -> FileRecord {
    let (id, filename, user_id, uploaded_at) = row;
    FileRecord {
        id,
        filename,
        user_id,
        uploaded_at,
    }
}

/// Query operations for database storage
pub struct Queries;

impl Queries {
    /// Insert a user unless the email is taken; `None` means it was
    pub async fn insert_user(pool: &PgPool, user: &NewUser) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, email, password_hash, is_ops) VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO NOTHING RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_ops)
        .fetch_optional(pool)
        .await
        .context("Failed to insert user")?;

        Ok(row.map(user_from_row))
    }

    pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to query user by email")?;

        Ok(row.map(user_from_row))
    }

    pub async fn get_user(pool: &PgPool, user_id: i64) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to query user")?;

        Ok(row.map(user_from_row))
    }

    pub async fn mark_user_verified(pool: &PgPool, user_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET is_verified = TRUE WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await
            .context("Failed to mark user verified")?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn insert_file(
        pool: &PgPool,
        user_id: i64,
        filename: &str,
        content: &[u8],
    ) -> Result<FileRecord> {
        let row = sqlx::query_as::<_, FileRow>(&format!(
            "INSERT INTO files (filename, user_id, content) VALUES ($1, $2, $3) RETURNING {}",
            FILE_COLUMNS
        ))
        .bind(filename)
        .bind(user_id)
        .bind(content)
        .fetch_one(pool)
        .await
        .context("Failed to store file")?;

        Ok(file_from_row(row))
    }

    pub async fn list_files(pool: &PgPool) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {} FROM files ORDER BY id",
            FILE_COLUMNS
        ))
        .fetch_all(pool)
        .await
        .context("Failed to list files")?;

        Ok(rows.into_iter().map(file_from_row).collect())
    }

    pub async fn get_file(pool: &PgPool, file_id: i64) -> Result<Option<FileRecord>> {
        let row = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {} FROM files WHERE id = $1",
            FILE_COLUMNS
        ))
        .bind(file_id)
        .fetch_optional(pool)
        .await
        .context("Failed to query file")?;

        Ok(row.map(file_from_row))
    }

    pub async fn read_file_content(pool: &PgPool, file_id: i64) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query_as::<_, (Vec<u8>,)>("SELECT content FROM files WHERE id = $1")
            .bind(file_id)
            .fetch_optional(pool)
            .await
            .context("Failed to read file content")?;

        Ok(row.map(|(content,)| content))
    }

    pub async fn delete_consumed_tokens_older_than(pool: &PgPool, age: Duration) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM consumed_tokens WHERE consumed_at < NOW() - make_interval(secs => $1)",
        )
        .bind(age.as_secs_f64())
        .execute(pool)
        .await
        .context("Failed to prune consumed tokens")?;
        Ok(result.rows_affected())
    }

    /// The primary key makes this a check-and-set: only one insert can win
    pub async fn insert_consumed_token(pool: &PgPool, fingerprint: &str) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO consumed_tokens (fingerprint) VALUES ($1)
             ON CONFLICT (fingerprint) DO NOTHING",
        )
        .bind(fingerprint)
        .execute(pool)
        .await
        .context("Failed to record consumed token")?;
        Ok(result.rows_affected() == 1)
    }
}
