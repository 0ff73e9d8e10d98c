use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_HOST, DEFAULT_JWT_EXPIRES_SECONDS, DEFAULT_MAIL_SENDER,
    DEFAULT_PORT, DEFAULT_PUBLIC_URL, DEFAULT_TOKEN_MAX_AGE_SECONDS, MAX_LIFETIME_SECONDS,
    STORAGE_TYPE_DATABASE, STORAGE_TYPE_FILESYSTEM,
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::time::Duration;
use storage::DatabaseRetryConfig;
use tracing::{error, warn};

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Storage backend type
    pub storage_type: StorageType,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Data directory for filesystem storage
    pub data_dir: PathBuf,
    /// Database URL for database storage
    pub database_url: Option<String>,
    /// Database retry configuration
    pub database_retry_config: DatabaseRetryConfig,
    /// Secret keying verification and download links
    pub secret_key: String,
    /// Secret keying access tokens
    pub jwt_secret: String,
    /// How long verification and download links stay valid
    pub token_max_age: Duration,
    /// How long access tokens stay valid
    pub jwt_expires: Duration,
    /// Base URL put in front of links sent to users
    pub public_url: String,
    /// Emails (lowercase) that register as ops users
    pub ops_emails: Vec<String>,
    /// Reject a verification or download link after its first use
    pub single_use_links: bool,
    /// Sender address on outgoing mail
    pub mail_sender: String,
}

/// Storage backend type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    Filesystem,
    Database,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("storage_type", &self.storage_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("token_max_age", &self.token_max_age)
            .field("jwt_expires", &self.jwt_expires)
            .field("public_url", &self.public_url)
            .field("ops_emails", &self.ops_emails)
            .field("single_use_links", &self.single_use_links)
            .finish_non_exhaustive()
    }
}

fn invalid_input(message: String) -> std::io::Error {
    error!("{}", message);
    std::io::Error::new(std::io::ErrorKind::InvalidInput, message)
}

/// Command-line value, then environment variable, then nothing
fn arg_or_env(matches: &ArgMatches, arg: &str, env: &str) -> Option<String> {
    matches
        .get_one::<String>(arg)
        .cloned()
        .or_else(|| std::env::var(env).ok())
        .filter(|v| !v.trim().is_empty())
}

fn parse_seconds(value: &str, what: &str) -> Result<Duration, std::io::Error> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 && secs <= MAX_LIFETIME_SECONDS => Ok(Duration::from_secs(secs)),
        _ => Err(invalid_input(format!(
            "Invalid {}: {}. Must be between 1 and {} seconds",
            what, value, MAX_LIFETIME_SECONDS
        ))),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Split a comma separated list into trimmed, lowercase, non-empty entries
pub fn parse_email_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|e| e.trim().to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

impl ServerConfig {
    pub fn command() -> Command {
        Command::new("server")
            .about("Office document sharing server")
            .arg(
                Arg::new("storage")
                    .long("storage")
                    .value_name("TYPE")
                    .help("Storage backend type: 'fs' for filesystem or 'db' for database")
                    .default_value(STORAGE_TYPE_FILESYSTEM),
            )
            .arg(
                Arg::new("data-dir")
                    .long("data-dir")
                    .value_name("DIR")
                    .help("Data directory for filesystem storage")
                    .default_value(DEFAULT_DATA_DIR),
            )
            .arg(
                Arg::new("database-url")
                    .long("database-url")
                    .value_name("URL")
                    .help("Database URL for database storage (can also use DATABASE_URL env var)"),
            )
            .arg(
                Arg::new("port")
                    .long("port")
                    .value_name("PORT")
                    .help("Server port (default: 8080, or SERVER_PORT env var)"),
            )
            .arg(
                Arg::new("host")
                    .long("host")
                    .value_name("HOST")
                    .help("Server host (default: 0.0.0.0, or SERVER_HOST env var)"),
            )
            .arg(
                Arg::new("secret-key")
                    .long("secret-key")
                    .value_name("SECRET")
                    .help("Secret for signing verification and download links (or SECRET_KEY env var)"),
            )
            .arg(
                Arg::new("jwt-secret")
                    .long("jwt-secret")
                    .value_name("SECRET")
                    .help("Secret for signing access tokens (or JWT_SECRET_KEY env var)"),
            )
            .arg(
                Arg::new("token-max-age")
                    .long("token-max-age")
                    .value_name("SECONDS")
                    .help("Link lifetime (default: 3600, or TOKEN_MAX_AGE_SECONDS env var)"),
            )
            .arg(
                Arg::new("jwt-expires")
                    .long("jwt-expires")
                    .value_name("SECONDS")
                    .help("Access token lifetime (default: 900, or JWT_EXPIRES_SECONDS env var)"),
            )
            .arg(
                Arg::new("public-url")
                    .long("public-url")
                    .value_name("URL")
                    .help("Base URL used in emailed links (or PUBLIC_URL env var)"),
            )
            .arg(
                Arg::new("ops-emails")
                    .long("ops-emails")
                    .value_name("EMAILS")
                    .help("Comma separated emails that sign up as ops users (or OPS_EMAILS env var)"),
            )
            .arg(
                Arg::new("single-use-links")
                    .long("single-use-links")
                    .action(ArgAction::SetTrue)
                    .help("Accept each link only once (or SINGLE_USE_LINKS=true)"),
            )
            .arg(
                Arg::new("mail-sender")
                    .long("mail-sender")
                    .value_name("EMAIL")
                    .help("Sender address on outgoing mail (or MAIL_DEFAULT_SENDER env var)"),
            )
    }

    pub fn load() -> Result<Self, std::io::Error> {
        Self::from_matches(&Self::command().get_matches())
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Self, std::io::Error> {
        // Determine storage type
        let storage_type_str = matches
            .get_one::<String>("storage")
            .map(|s| s.as_str())
            .unwrap_or(STORAGE_TYPE_FILESYSTEM);
        let storage_type = match storage_type_str {
            STORAGE_TYPE_DATABASE => StorageType::Database,
            STORAGE_TYPE_FILESYSTEM => StorageType::Filesystem,
            _ => {
                return Err(invalid_input(format!(
                    "Invalid storage type: {}. Must be '{}' or '{}'",
                    storage_type_str, STORAGE_TYPE_FILESYSTEM, STORAGE_TYPE_DATABASE
                )));
            }
        };

        let data_dir = PathBuf::from(
            matches
                .get_one::<String>("data-dir")
                .map(|s| s.as_str())
                .unwrap_or(DEFAULT_DATA_DIR),
        );

        let database_url = if storage_type == StorageType::Database {
            Some(arg_or_env(matches, "database-url", "DATABASE_URL").ok_or_else(|| {
                invalid_input(
                    "Database URL required when using database storage. Set --database-url or DATABASE_URL env var"
                        .to_string(),
                )
            })?)
        } else {
            None
        };

        let host = arg_or_env(matches, "host", "SERVER_HOST")
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port_str = arg_or_env(matches, "port", "SERVER_PORT")
            .unwrap_or_else(|| DEFAULT_PORT.to_string());
        let port = port_str
            .parse()
            .map_err(|_| invalid_input(format!("Invalid port number: {}", port_str)))?;

        let secret_key = arg_or_env(matches, "secret-key", "SECRET_KEY").ok_or_else(|| {
            invalid_input("Secret key required. Set --secret-key or SECRET_KEY env var".to_string())
        })?;

        let jwt_secret = match arg_or_env(matches, "jwt-secret", "JWT_SECRET_KEY") {
            Some(secret) => secret,
            None => {
                warn!("No JWT secret configured; access tokens are signed with the secret key");
                secret_key.clone()
            }
        };

        let token_max_age = parse_seconds(
            &arg_or_env(matches, "token-max-age", "TOKEN_MAX_AGE_SECONDS")
                .unwrap_or_else(|| DEFAULT_TOKEN_MAX_AGE_SECONDS.to_string()),
            "token max age",
        )?;
        let jwt_expires = parse_seconds(
            &arg_or_env(matches, "jwt-expires", "JWT_EXPIRES_SECONDS")
                .unwrap_or_else(|| DEFAULT_JWT_EXPIRES_SECONDS.to_string()),
            "JWT lifetime",
        )?;

        let public_url = arg_or_env(matches, "public-url", "PUBLIC_URL")
            .unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let ops_emails = arg_or_env(matches, "ops-emails", "OPS_EMAILS")
            .map(|v| parse_email_list(&v))
            .unwrap_or_default();

        let single_use_links = matches.get_flag("single-use-links")
            || std::env::var("SINGLE_USE_LINKS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false);

        let mail_sender = arg_or_env(matches, "mail-sender", "MAIL_DEFAULT_SENDER")
            .unwrap_or_else(|| DEFAULT_MAIL_SENDER.to_string());

        Ok(ServerConfig {
            storage_type,
            host,
            port,
            data_dir,
            database_url,
            database_retry_config: DatabaseRetryConfig::from_env(),
            secret_key,
            jwt_secret,
            token_max_age,
            jwt_expires,
            public_url,
            ops_emails,
            single_use_links,
            mail_sender,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
