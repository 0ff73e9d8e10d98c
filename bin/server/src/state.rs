//! Server application state management

use crate::auth::JwtManager;
use crate::config::ServerConfig;
use crate::mailer::Mailer;
use crypto::{
    token_fingerprint, Clock, ConfigError, SystemClock, TokenConfig, TokenPurpose, TokenSigner,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use storage::Storage;
use tracing::warn;

/// Shared, read-only state handed to every request
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub verification_tokens: TokenSigner,
    pub download_tokens: TokenSigner,
    pub jwt: JwtManager,
    pub mailer: Arc<dyn Mailer>,
    pub public_url: String,
    pub mail_sender: String,
    pub ops_emails: HashSet<String>,
    pub single_use_links: bool,
}

impl AppState {
    pub fn new(
        config: &ServerConfig,
        storage: Arc<dyn Storage>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, ConfigError> {
        Self::with_clock(config, storage, mailer, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &ServerConfig,
        storage: Arc<dyn Storage>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let token_config = TokenConfig::new(config.secret_key.clone(), config.token_max_age)?;
        Ok(Self {
            storage,
            verification_tokens: TokenSigner::with_clock(
                TokenPurpose::EmailVerification,
                &token_config,
                clock.clone(),
            )?,
            download_tokens: TokenSigner::with_clock(
                TokenPurpose::FileDownload,
                &token_config,
                clock,
            )?,
            jwt: JwtManager::new(&config.jwt_secret, config.jwt_expires),
            mailer,
            public_url: config.public_url.clone(),
            mail_sender: config.mail_sender.clone(),
            ops_emails: config.ops_emails.iter().cloned().collect(),
            single_use_links: config.single_use_links,
        })
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/verify-email/{}", self.public_url, token)
    }

    pub fn download_link(&self, token: &str) -> String {
        format!("{}/download/{}", self.public_url, token)
    }

    /// Record a link verified by `signer` as used when links are single-use.
    /// Returns false when the link was already redeemed.
    pub async fn redeem_link(&self, signer: &TokenSigner, token: &str) -> anyhow::Result<bool> {
        if !self.single_use_links {
            return Ok(true);
        }
        // Token ages are whole seconds, so a link stays valid up to a second past max age
        let retention = signer.max_age().saturating_add(Duration::from_secs(1));
        let first_use = self
            .storage
            .consume_token(&token_fingerprint(token), retention)
            .await?;
        if !first_use {
            warn!(
                purpose = signer.purpose().salt(),
                "Rejected reuse of a single-use link"
            );
        }
        Ok(first_use)
    }
}
