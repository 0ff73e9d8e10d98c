//! Access tokens (HS256 JWT) and the extractor guarding protected routes

use crate::handlers::error::unauthorized;
use crate::state::AppState;
use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::time::Duration;
use storage::UserRecord;
use tracing::debug;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub is_ops: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks access tokens
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in: Duration,
}

impl JwtManager {
    pub fn new(secret: &str, expires_in: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expires_in,
        }
    }

    pub fn issue(&self, user: &UserRecord) -> Result<String> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(self.expires_in.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .context("Access token lifetime is out of range")?;
        let claims = Claims {
            sub: user.id.to_string(),
            is_ops: user.is_ops,
            iat: now,
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to encode access token")
    }

    pub fn decode(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .context("Failed to decode access token")?;
        Ok(data.claims)
    }
}

/// The caller behind a valid `Authorization: Bearer` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub is_ops: bool,
}

impl AuthenticatedUser {
    fn from_claims(claims: Claims) -> Result<Self> {
        let user_id = claims
            .sub
            .parse()
            .context("Access token subject is not a user id")?;
        Ok(Self {
            user_id,
            is_ops: claims.is_ops,
        })
    }
}

fn extract_bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, actix_web::Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| unauthorized("Authentication is not configured"))?;
    let token = extract_bearer_token(req)
        .ok_or_else(|| unauthorized("Missing or invalid Authorization header"))?;
    state
        .jwt
        .decode(token)
        .and_then(AuthenticatedUser::from_claims)
        .map_err(|e| {
            debug!("Rejected access token: {:#}", e);
            unauthorized("Invalid or expired access token")
        })
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
