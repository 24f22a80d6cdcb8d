//! CLI argument parsing, validation, and startup helpers.

use std::path::PathBuf;

use crate::ServerConfig;
use crate::auth::SecureCookies;
use crate::db::Database;
use crate::rate_limit::RateLimitConfig;
use clap::Parser;
use tracing::{error, info, warn};

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "classifieds", about = "Classified ads with cookie sessions")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, env = "DATABASE", default_value = "classifieds.db")]
    pub database: String,

    /// Directory for uploaded avatars
    #[arg(long, env = "UPLOAD_DIR", default_value = "public/uploads")]
    pub upload_dir: PathBuf,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// When to mark the session cookie Secure.
    ///
    /// `auto` follows the request: behind a TLS-terminating reverse proxy the
    /// server only sees plain HTTP, so pass `--trust-proxy` (to honour
    /// X-Forwarded-Proto) or use `always`.
    #[arg(long, value_enum, default_value = "auto")]
    pub secure_cookies: SecureCookies,

    /// Trust X-Forwarded-Proto and X-Forwarded-For (only behind a reverse proxy).
    ///
    /// Required for `--secure-cookies auto` to detect HTTPS terminated at the proxy.
    #[arg(long)]
    pub trust_proxy: bool,

    /// Give an existing user the admin flag on startup
    #[arg(long, value_name = "USERNAME")]
    pub grant_admin: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Startup configuration problems. All of them are fatal.
#[derive(Debug)]
pub enum ConfigError {
    MissingSecret,
    SecretTooShort,
    SecretFile { path: String, source: std::io::Error },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingSecret => write!(
                f,
                "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
            ),
            ConfigError::SecretTooShort => write!(
                f,
                "JWT secret is shorter than {} characters. Use a longer secret",
                MIN_JWT_SECRET_LENGTH
            ),
            ConfigError::SecretFile { path, source } => {
                write!(f, "Failed to read JWT secret file {}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Check a secret read from the environment or a file.
fn validate_secret(secret: String) -> Result<String, ConfigError> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::SecretTooShort);
    }
    Ok(secret)
}

/// Load the JWT secret from `env_secret` (normally `JWT_SECRET`) or from a file.
pub fn resolve_jwt_secret(
    env_secret: Option<String>,
    jwt_secret_file: Option<&str>,
) -> Result<String, ConfigError> {
    if let Some(secret) = env_secret {
        return validate_secret(secret);
    }
    let Some(path) = jwt_secret_file else {
        return Err(ConfigError::MissingSecret);
    };
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::SecretFile {
        path: path.to_string(),
        source,
    })?;
    validate_secret(content.trim().to_string())
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
///
/// Must run before the async runtime or any other thread is started.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let env_secret = std::env::var("JWT_SECRET").ok();
    if env_secret.is_some() {
        // Clear the environment variable to prevent leaking
        // SAFETY: `main` calls this before building the tokio runtime, so no
        // other thread exists that could read the environment concurrently.
        unsafe { std::env::remove_var("JWT_SECRET") };
    }

    match resolve_jwt_secret(env_secret, jwt_secret_file) {
        Ok(secret) => Some(secret),
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            None
        }
    }
}

/// Handle the --grant-admin flag. Failing to promote is logged but not fatal.
pub async fn handle_grant_admin(db: &Database, username: &str) {
    match db.users().grant_admin(username).await {
        Ok(true) => info!(username = %username, "Granted admin flag"),
        Ok(false) => warn!(username = %username, "Cannot grant admin flag: no such user"),
        Err(e) => error!(username = %username, error = %e, "Failed to grant admin flag"),
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    secure_cookies: SecureCookies,
    trust_proxy: bool,
    upload_dir: PathBuf,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        secure_cookies,
        trust_proxy,
        upload_dir,
        rate_limit: Some(RateLimitConfig::new(trust_proxy)),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
