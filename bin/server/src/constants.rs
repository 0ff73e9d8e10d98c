/// Default data directory for filesystem storage
pub const DEFAULT_DATA_DIR: &str = "server_data";

/// Default server host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_PORT: &str = "8080";

/// Storage type identifier for database
pub const STORAGE_TYPE_DATABASE: &str = "db";

/// Storage type identifier for filesystem (also used as the default storage type)
pub const STORAGE_TYPE_FILESYSTEM: &str = "fs";

/// Default lifetime of verification and download links in seconds (1 hour)
pub const DEFAULT_TOKEN_MAX_AGE_SECONDS: &str = "3600";

/// Default lifetime of access tokens in seconds (15 minutes)
pub const DEFAULT_JWT_EXPIRES_SECONDS: &str = "900";

/// Longest accepted link or access token lifetime in seconds (10 years)
pub const MAX_LIFETIME_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Base URL used when building links sent to users
pub const DEFAULT_PUBLIC_URL: &str = "http://127.0.0.1:8080";

/// Sender address on outgoing mail
pub const DEFAULT_MAIL_SENDER: &str = "no-reply@localhost";
