//! Signed, expiring, purpose-scoped tokens
//!
//! A token is `payload.timestamp.signature`, each segment unpadded URL-safe
//! base64. The payload is the JSON-encoded identifier, the timestamp is the
//! issuance second (big-endian, leading zero bytes stripped) and the signature
//! is HMAC-SHA256 over the first two segments, keyed per purpose.

use crate::clock::{Clock, SystemClock};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use constant_time_eq::constant_time_eq;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Default lifetime of a token (1 hour)
pub const DEFAULT_TOKEN_MAX_AGE: Duration = Duration::from_secs(3600);

/// Upper bound on accepted token length; anything longer is rejected unparsed
const MAX_TOKEN_LEN: usize = 1024;

const KEY_DERIVATION_INFO: &[u8] = b"signer";
const SEPARATOR: char = '.';

/// The single outcome of a failed verification
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is invalid or expired")]
    InvalidOrExpired,
}

/// Rejected token configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("token secret must not be empty")]
    EmptySecret,
    #[error("token max age must be at least one second")]
    InvalidMaxAge,
}

/// What a token may be redeemed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPurpose {
    EmailVerification,
    FileDownload,
}

impl TokenPurpose {
    pub fn salt(&self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "email-verification",
            TokenPurpose::FileDownload => "file-download",
        }
    }
}

/// Immutable signing configuration shared by every signer built from it
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    max_age: Duration,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>, max_age: Duration) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if max_age.as_secs() == 0 {
            return Err(ConfigError::InvalidMaxAge);
        }
        Ok(Self { secret, max_age })
    }

    pub fn with_default_max_age(secret: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(secret, DEFAULT_TOKEN_MAX_AGE)
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("max_age", &self.max_age)
            .finish()
    }
}

/// Issues and verifies tokens for one purpose
#[derive(Clone)]
pub struct TokenSigner {
    purpose: TokenPurpose,
    max_age_secs: u64,
    mac: HmacSha256,
    clock: Arc<dyn Clock>,
}

impl TokenSigner {
    /// Create a signer reading the system clock
    pub fn new(purpose: TokenPurpose, config: &TokenConfig) -> Result<Self, ConfigError> {
        Self::with_clock(purpose, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        purpose: TokenPurpose,
        config: &TokenConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let key = derive_key(config.secret.as_bytes(), purpose.salt())?;
        let mac = HmacSha256::new_from_slice(&key).map_err(|_| ConfigError::EmptySecret)?;
        Ok(Self {
            purpose,
            max_age_secs: config.max_age.as_secs(),
            mac,
            clock,
        })
    }

    pub fn purpose(&self) -> TokenPurpose {
        self.purpose
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    /// Issue a token for `identifier` stamped with the current time
    pub fn issue(&self, identifier: i64) -> String {
        self.issue_at(identifier, self.clock.now())
    }

    /// Issue a token for `identifier` stamped with `now`
    pub fn issue_at(&self, identifier: i64, now: u64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(identifier.to_string());
        let timestamp = URL_SAFE_NO_PAD.encode(encode_timestamp(now));
        let signed = format!("{}{}{}", payload, SEPARATOR, timestamp);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(signed.as_bytes()));
        format!("{}{}{}", signed, SEPARATOR, signature)
    }

    /// Verify `token` against the current time
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        self.verify_at(token, self.clock.now())
    }

    /// Verify `token` as if the current time were `now`
    pub fn verify_at(&self, token: &str, now: u64) -> Result<i64, TokenError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(TokenError::InvalidOrExpired);
        }

        let (signed, signature) = token
            .rsplit_once(SEPARATOR)
            .ok_or(TokenError::InvalidOrExpired)?;
        let (payload, timestamp) = signed
            .split_once(SEPARATOR)
            .ok_or(TokenError::InvalidOrExpired)?;
        if timestamp.contains(SEPARATOR) {
            return Err(TokenError::InvalidOrExpired);
        }

        let provided = decode_segment(signature)?;
        let expected = self.sign(signed.as_bytes());
        if !constant_time_eq(&expected, &provided) {
            return Err(TokenError::InvalidOrExpired);
        }

        let issued_at = decode_timestamp(&decode_segment(timestamp)?)?;
        let age = now
            .checked_sub(issued_at)
            .ok_or(TokenError::InvalidOrExpired)?;
        if age > self.max_age_secs {
            return Err(TokenError::InvalidOrExpired);
        }

        let payload = decode_segment(payload)?;
        serde_json::from_slice::<i64>(&payload).map_err(|_| TokenError::InvalidOrExpired)
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("purpose", &self.purpose)
            .field("max_age_secs", &self.max_age_secs)
            .finish_non_exhaustive()
    }
}

/// HKDF-SHA256 with the purpose salt, so each purpose signs with its own key
fn derive_key(secret: &[u8], salt: &str) -> Result<[u8; 32], ConfigError> {
    let hkdf = Hkdf::<Sha256>::new(Some(salt.as_bytes()), secret);
    let mut key = [0u8; 32];
    hkdf.expand(KEY_DERIVATION_INFO, &mut key)
        .map_err(|_| ConfigError::EmptySecret)?;
    Ok(key)
}

fn encode_timestamp(secs: u64) -> Vec<u8> {
    let bytes = secs.to_be_bytes();
    let first = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}

fn decode_timestamp(bytes: &[u8]) -> Result<u64, TokenError> {
    if bytes.is_empty() || bytes.len() > 8 {
        return Err(TokenError::InvalidOrExpired);
    }
    Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, TokenError> {
    if segment.is_empty() {
        return Err(TokenError::InvalidOrExpired);
    }
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::InvalidOrExpired)
}
