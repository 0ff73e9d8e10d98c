//! Blocking HTTP calls to the document exchange server

use crate::constants::{
    FILES_ENDPOINT, HEALTH_ENDPOINT, LOGIN_ENDPOINT, SIGNUP_ENDPOINT, VERIFY_EMAIL_ENDPOINT,
};
use anyhow::{Context, Result};
use common::{
    DownloadLinkResponse, FileEntry, HealthResponse, LoginRequest, LoginResponse,
    MessageResponse, SignupRequest,
};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

pub struct ApiClient {
    server: String,
    http: Client,
    access_token: Option<String>,
}

/// Turn a non-2xx response into an error carrying the server's message
pub fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response
        .text()
        .unwrap_or_else(|_| "Unknown error".to_string());
    let message = serde_json::from_str::<MessageResponse>(&text)
        .map(|m| m.message)
        .unwrap_or(text);
    anyhow::bail!("Server returned {}: {}", status, message)
}

impl ApiClient {
    pub fn new(server: &str) -> Self {
        Self {
            server: server.trim_end_matches('/').to_string(),
            http: Client::new(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: String) -> Self {
        self.access_token = Some(token);
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.get(self.url(path)))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.post(self.url(path)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request.send().context("Failed to connect to server")?;
        debug!("{} -> {}", what, response.status());
        check(response)?
            .json()
            .with_context(|| format!("Failed to parse {} response", what))
    }

    pub fn signup(&self, username: &str, email: &str, password: &str) -> Result<String> {
        let body = SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: MessageResponse =
            self.send_json(self.post(SIGNUP_ENDPOINT).json(&body), "signup")?;
        Ok(response.message)
    }

    pub fn verify_email(&self, token: &str) -> Result<String> {
        let path = format!("{}/{}", VERIFY_EMAIL_ENDPOINT, token);
        let response: MessageResponse = self.send_json(self.get(&path), "verify-email")?;
        Ok(response.message)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<String> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse =
            self.send_json(self.post(LOGIN_ENDPOINT).json(&body), "login")?;
        Ok(response.access_token)
    }

    pub fn list_files(&self) -> Result<Vec<FileEntry>> {
        self.send_json(self.get(FILES_ENDPOINT), "list files")
    }

    pub fn download_link(&self, file_id: i64) -> Result<DownloadLinkResponse> {
        let path = format!("{}/{}/download-link", FILES_ENDPOINT, file_id);
        self.send_json(self.get(&path), "download link")
    }

    pub fn health(&self) -> Result<HealthResponse> {
        self.send_json(self.get(HEALTH_ENDPOINT), "health")
    }
}
