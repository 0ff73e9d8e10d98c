//! Access token persisted between client invocations

use crate::constants::ACCESS_TOKEN_FILE;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

fn token_path(data_dir: &Path) -> PathBuf {
    data_dir.join(ACCESS_TOKEN_FILE)
}

pub fn save_access_token(data_dir: &Path, token: &str) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;
    let path = token_path(data_dir);
    fs::write(&path, token).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(path)
}

pub fn load_access_token(data_dir: &Path) -> Result<String> {
    let path = token_path(data_dir);
    let token = fs::read_to_string(&path)
        .with_context(|| format!("No saved access token at {:?}. Run `client login` first", path))?;
    let token = token.trim();
    anyhow::ensure!(!token.is_empty(), "Saved access token at {:?} is empty", path);
    Ok(token.to_string())
}
