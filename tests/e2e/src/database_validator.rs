use anyhow::{Context, Result};
use sqlx::PgPool;

async fn connect(database_url: &str) -> Result<PgPool> {
    PgPool::connect(database_url)
        .await
        .context("Failed to connect to database")
}

/// Id and verification flag of the user registered under `email`
pub async fn find_user(database_url: &str, email: &str) -> Result<(i64, bool)> {
    let pool = connect(database_url).await?;
    let row: Option<(i64, bool)> =
        sqlx::query_as("SELECT id, is_verified FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&pool)
            .await
            .context("Failed to look up user")?;
    row.with_context(|| format!("User {} not found in database", email))
}

pub async fn validate_upload(
    database_url: &str,
    file_id: i64,
    filename: &str,
    expected_content: &[u8],
) -> Result<()> {
    let pool = connect(database_url).await?;

    let row: Option<(String, Vec<u8>)> =
        sqlx::query_as("SELECT filename, content FROM files WHERE id = $1")
            .bind(file_id)
            .fetch_optional(&pool)
            .await
            .context("Failed to load file row")?;
    let (stored_name, content) =
        row.with_context(|| format!("File {} not found in database", file_id))?;

    if stored_name != filename {
        anyhow::bail!("Expected filename {}, found {}", filename, stored_name);
    }
    println!("  ✓ File {} stored as {}", file_id, stored_name);

    if content != expected_content {
        anyhow::bail!(
            "Stored content differs: {} bytes, expected {}",
            content.len(),
            expected_content.len()
        );
    }
    println!("  ✓ Stored content matches ({} bytes)", content.len());

    Ok(())
}

/// Clean up test users; their files go with them
pub async fn cleanup_test_data(database_url: &str, emails: &[&str]) -> Result<()> {
    let keep_data = std::env::var("KEEP_TEST_DATA").unwrap_or_else(|_| "false".to_string());
    if keep_data == "true" {
        println!("⚠️  Keeping database test data (KEEP_TEST_DATA=true)");
        return Ok(());
    }

    let pool = connect(database_url).await?;
    println!("🧹 Cleaning up database test data...");

    for email in emails {
        sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(&pool)
            .await
            .with_context(|| format!("Failed to delete user {}", email))?;
    }
    println!("✅ Test users and their files cleaned up");

    Ok(())
}
