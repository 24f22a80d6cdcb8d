pub mod api;
pub mod auth;
pub mod cli;
pub mod credentials;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;
pub mod uploads;
pub mod validation;

use api::{create_api_router, create_pages_router, not_found};
use auth::{CookieBinder, SecureCookies, ServerSettings, apply_session_cookie};
use axum::{Router, extract::DefaultBodyLimit, middleware};
use db::Database;
use jwt::JwtConfig;
use rate_limit::RateLimitConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use uploads::AvatarStore;

/// Maximum accepted request body: 64 MiB.
pub const MAX_REQUEST_SIZE: usize = 64 * 1024 * 1024;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing session tokens
    pub jwt_secret: Vec<u8>,
    /// When to set the Secure flag on the session cookie
    pub secure_cookies: SecureCookies,
    /// Trust X-Forwarded-Proto / X-Forwarded-For from a reverse proxy
    pub trust_proxy: bool,
    /// Directory where avatar uploads are written
    pub upload_dir: PathBuf,
    /// Login/signup rate limiting; `None` disables it
    pub rate_limit: Option<RateLimitConfig>,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(&config.jwt_secret));

    let settings = Arc::new(ServerSettings {
        cookie: CookieBinder::default(),
        secure_cookies: config.secure_cookies,
        trust_proxy: config.trust_proxy,
    });

    let api_router = create_api_router(
        config.db.clone(),
        jwt.clone(),
        settings.clone(),
        AvatarStore::new(config.upload_dir.clone()),
        config.rate_limit.clone().map(Arc::new),
    );

    Router::new()
        .nest("/api", api_router)
        .merge(create_pages_router(jwt, settings.clone()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_SIZE))
        .layer(middleware::from_fn_with_state(settings, apply_session_cookie))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
