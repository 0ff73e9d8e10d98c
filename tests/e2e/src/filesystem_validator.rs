use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

fn load_records(server_data_dir: &Path) -> Result<serde_json::Value> {
    let records_file = server_data_dir.join("records.json");
    let content = fs::read_to_string(&records_file)
        .with_context(|| format!("Failed to read {:?}", records_file))?;
    serde_json::from_str(&content).context("Failed to parse records JSON")
}

/// Id and verification flag of the user registered under `email`
pub fn find_user(server_data_dir: &Path, email: &str) -> Result<(i64, bool)> {
    let records = load_records(server_data_dir)?;
    let user = records
        .get("users")
        .and_then(|v| v.as_array())
        .context("Invalid records format: missing users array")?
        .iter()
        .find(|u| u.get("email").and_then(|e| e.as_str()) == Some(email))
        .with_context(|| format!("User {} not found in records", email))?;

    let id = user
        .get("id")
        .and_then(|v| v.as_i64())
        .context("User record has no id")?;
    let is_verified = user
        .get("is_verified")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    Ok((id, is_verified))
}

pub fn validate_upload(
    server_data_dir: &Path,
    file_id: i64,
    filename: &str,
    expected_content: &[u8],
) -> Result<()> {
    let records = load_records(server_data_dir)?;
    let listed = records
        .get("files")
        .and_then(|v| v.as_array())
        .context("Invalid records format: missing files array")?
        .iter()
        .any(|f| {
            f.get("id").and_then(|v| v.as_i64()) == Some(file_id)
                && f.get("filename").and_then(|v| v.as_str()) == Some(filename)
        });
    if !listed {
        anyhow::bail!("File {} ({}) not found in records", file_id, filename);
    }
    println!("  ✓ File {} recorded as {}", file_id, filename);

    let blob = server_data_dir
        .join("files")
        .join(file_id.to_string())
        .join(filename);
    let content = fs::read(&blob).with_context(|| format!("Failed to read {:?}", blob))?;
    if content != expected_content {
        anyhow::bail!("Stored content differs: {:?}", blob);
    }
    println!("  ✓ Stored content matches ({} bytes)", content.len());

    Ok(())
}

pub fn validate_downloaded_file(downloaded_file: &Path, expected_content: &[u8]) -> Result<()> {
    if !downloaded_file.exists() {
        anyhow::bail!("Downloaded file does not exist: {:?}", downloaded_file);
    }
    println!("  ✓ Downloaded file exists: {:?}", downloaded_file);

    let content = fs::read(downloaded_file).context("Failed to read downloaded file")?;
    if content != expected_content {
        anyhow::bail!(
            "Downloaded content differs: {} bytes, expected {}",
            content.len(),
            expected_content.len()
        );
    }
    println!("  ✓ Downloaded file content matches ({} bytes)", content.len());

    Ok(())
}
