use crate::api::{check, ApiClient};
use crate::constants::DOWNLOAD_ENDPOINT;
use anyhow::{Context, Result};
use common::file_utils;
use log::info;
use reqwest::header::CONTENT_DISPOSITION;
use std::fs;
use std::path::{Path, PathBuf};

/// Filename from an `attachment; filename="..."` header value
fn attachment_filename(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|param| {
        let value = param.strip_prefix("filename=")?;
        let value = value.trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Download the document behind a link token into `output_dir`
pub fn download_file(api: &ApiClient, token: &str, output_dir: &Path) -> Result<PathBuf> {
    let path = format!("{}/{}", DOWNLOAD_ENDPOINT, token);
    let response = api.get(&path).send().context("Failed to connect to server")?;
    let response = check(response).context("Download failed")?;

    let filename = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(attachment_filename)
        .ok_or_else(|| anyhow::anyhow!("Server response has no attachment filename"))?;

    // Never trust a server-supplied name as a path
    file_utils::validate_filename(&filename)
        .map_err(|e| anyhow::anyhow!("{}: {}", e.message(), filename))?;

    let content = response.bytes().context("Failed to read download body")?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
    let output_path = output_dir.join(&filename);
    fs::write(&output_path, &content)
        .with_context(|| format!("Failed to write {:?}", output_path))?;

    info!("Downloaded {} ({} bytes)", filename, content.len());
    println!("File saved to: {}", output_path.display());
    Ok(output_path)
}
