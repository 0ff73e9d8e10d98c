pub mod file_utils;
pub mod utils;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /signup`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /login`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginResponse {
    pub access_token: String, // HS256 JWT, sent back as a Bearer token
}

/// Plain `{"message": ...}` body used for successes and errors alike
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UploadResponse {
    pub message: String,
    pub file_id: i64,
}

/// One entry of `GET /files`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FileEntry {
    pub id: i64,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Response of `GET /files/{id}/download-link`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DownloadLinkResponse {
    pub download_url: String,
    pub token: String,
    pub expires_in: u64, // seconds
}

/// Response from health check endpoint
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String, // "ok" when healthy
}
