use crate::api::{check, ApiClient};
use crate::constants::UPLOAD_ENDPOINT;
use anyhow::{Context, Result};
use common::{file_utils, UploadResponse};
use log::info;
use reqwest::blocking::multipart;
use std::fs;
use std::path::Path;

/// Filename to send for a local path, checked the same way the server checks it
pub fn upload_filename(path: &Path) -> Result<String> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Not a file path: {:?}", path))?
        .to_string();
    file_utils::validate_upload_filename(&filename)
        .map_err(|e| anyhow::anyhow!("{}: {}", e.message(), filename))?;
    Ok(filename)
}

/// Upload one document. Returns the id the server assigned
pub fn upload_file(api: &ApiClient, path: &Path) -> Result<i64> {
    let filename = upload_filename(path)?;
    let content = fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    let size = content.len();

    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(content)
            .file_name(filename.clone())
            .mime_str("application/octet-stream")
            .context("Failed to set MIME type")?,
    );

    let response = api
        .post(UPLOAD_ENDPOINT)
        .multipart(form)
        .send()
        .context("Failed to connect to server")?;
    let uploaded: UploadResponse = check(response)
        .with_context(|| format!("Upload failed for file {}", filename))?
        .json()
        .context("Failed to parse upload response")?;

    info!("Uploaded file: {} ({} bytes)", filename, size);
    println!("{} File id: {}", uploaded.message, uploaded.file_id);
    Ok(uploaded.file_id)
}
