pub mod clock;
pub mod passwords;
pub mod tokens;

use sha2::{Digest, Sha256};

pub use clock::{Clock, ManualClock, SystemClock};
pub use passwords::{hash_password, verify_password};
pub use tokens::{
    ConfigError, TokenConfig, TokenError, TokenPurpose, TokenSigner, DEFAULT_TOKEN_MAX_AGE,
};

/// Fingerprint of a token for replay tracking: SHA256(token), hex-encoded
pub fn token_fingerprint(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
