mod ads;
mod auth;
mod error;
mod pages;

use axum::Router;
use std::sync::Arc;

use crate::auth::ServerSettings;
use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;
use crate::uploads::AvatarStore;

pub use error::{ApiError, ResultExt, not_found};

/// Create the API router (mounted under `/api`).
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    settings: Arc<ServerSettings>,
    avatars: AvatarStore,
    rate_limit: Option<Arc<RateLimitConfig>>,
) -> Router {
    let auth_state = auth::AuthApiState {
        db: db.clone(),
        jwt: jwt.clone(),
        settings: settings.clone(),
        avatars,
        rate_limit,
    };

    let ads_state = ads::AdsState { db, jwt, settings };

    Router::new()
        .nest("/auth", auth::router(auth_state))
        .nest("/ads", ads::router(ads_state))
}

/// Create the router for page metadata routes (mounted at the root).
pub fn create_pages_router(jwt: Arc<JwtConfig>, settings: Arc<ServerSettings>) -> Router {
    pages::router(pages::PagesState { jwt, settings })
}
