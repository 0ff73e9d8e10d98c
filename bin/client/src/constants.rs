/// Default client data directory
pub const CLIENT_DATA_DIR: &str = "client_data";

/// Saved access token filename
pub const ACCESS_TOKEN_FILE: &str = "access_token.txt";

/// Default downloaded files directory name
pub const DOWNLOADED_DIR: &str = "downloaded";

/// Default server URL
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

pub const SIGNUP_ENDPOINT: &str = "/signup";
pub const VERIFY_EMAIL_ENDPOINT: &str = "/verify-email";
pub const LOGIN_ENDPOINT: &str = "/login";
pub const FILES_ENDPOINT: &str = "/files";
pub const UPLOAD_ENDPOINT: &str = "/upload";
pub const DOWNLOAD_ENDPOINT: &str = "/download";
pub const HEALTH_ENDPOINT: &str = "/health";
