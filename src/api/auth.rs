//! Session endpoints.
//!
//! - GET `/user` - Current identity, or null (best effort)
//! - POST `/login` - Verify credentials and start a session
//! - POST `/signup` - Register, optionally with an avatar, and start a session
//! - GET `/logout` - Clear the session cookie

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::error::{ApiError, ResultExt};
use crate::auth::{Anonymous, Auth, Conflict, Identity, MaybeAuth, SecureTransport, ServerSettings};
use crate::credentials::{AuthFailure, CredentialVerifier};
use crate::db::{Database, NewUser};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::password::hash_password_async;
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_signup};
use crate::uploads::{AvatarStore, UploadedFile, prepare_avatar};
use crate::validation::{validate_email, validate_password, validate_username};

const INCORRECT_CREDENTIALS: &str = "Incorrect username or password";
const ALREADY_REGISTERED: &str = "Choose a different username or e-mail";

#[derive(Clone)]
pub struct AuthApiState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub settings: Arc<ServerSettings>,
    pub avatars: AvatarStore,
    pub rate_limit: Option<Arc<RateLimitConfig>>,
}

impl_has_auth_backend!(AuthApiState);

pub fn router(state: AuthApiState) -> Router {
    let session_router = Router::new()
        .route("/user", get(current_user))
        .route("/logout", get(logout))
        .with_state(state.clone());

    let login_router = Router::new()
        .route("/login", post(login))
        .with_state(state.clone());

    let signup_router = Router::new()
        .route("/signup", post(signup))
        .with_state(state.clone());

    let (login_router, signup_router) = match state.rate_limit {
        Some(limits) => (
            login_router.layer(middleware::from_fn_with_state(
                limits.clone(),
                rate_limit_login,
            )),
            signup_router.layer(middleware::from_fn_with_state(limits, rate_limit_signup)),
        ),
        None => (login_router, signup_router),
    };

    Router::new()
        .merge(session_router)
        .merge(login_router)
        .merge(signup_router)
}

#[derive(Serialize)]
struct CurrentUserResponse {
    success: &'static str,
    user: Option<Identity>,
}

#[derive(Serialize)]
struct SessionResponse {
    user: Identity,
    success: &'static str,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: &'static str,
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct SignupRequest {
    #[serde(default)]
    files: Vec<UploadedFile>,
    email: String,
    username: String,
    password: String,
}

/// Issue a token for `identity` and bind it to a JSON response.
fn start_session(
    state: &AuthApiState,
    identity: Identity,
    secure: bool,
    status: StatusCode,
    success: &'static str,
) -> Result<Response, ApiError> {
    let issued = state.jwt.issue(&identity).map_err(|e| {
        error!(user_id = identity.id, error = %e, "Failed to issue session token");
        ApiError::internal("Failed to create session")
    })?;

    let mut response = (
        status,
        Json(SessionResponse {
            user: identity,
            success,
        }),
    )
        .into_response();
    state
        .settings
        .cookie
        .bind(&mut response, &issued.token, secure);
    Ok(response)
}

async fn current_user(MaybeAuth(user): MaybeAuth) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        success: "OK",
        user,
    })
}

async fn login(
    State(state): State<AuthApiState>,
    SecureTransport(secure): SecureTransport,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let identity = match state
        .db
        .verify_credentials(&payload.username, &payload.password)
        .await
    {
        Ok(identity) => identity,
        Err(AuthFailure::BadCredentials) => {
            info!("Rejected login attempt");
            return Err(ApiError::unauthorized(INCORRECT_CREDENTIALS));
        }
        Err(e @ AuthFailure::Unavailable(_)) => {
            warn!(error = %e, "Login could not be completed");
            return Err(ApiError::unavailable(
                "Authentication temporarily unavailable",
            ));
        }
    };

    info!(user_id = identity.id, "User logged in");
    start_session(
        &state,
        identity,
        secure,
        StatusCode::OK,
        "Signed in successfully",
    )
}

async fn signup(
    State(state): State<AuthApiState>,
    _anonymous: Anonymous<Conflict>,
    SecureTransport(secure): SecureTransport,
    Json(payload): Json<SignupRequest>,
) -> Result<Response, ApiError> {
    let avatar = payload
        .files
        .first()
        .map(prepare_avatar)
        .transpose()?;

    validate_email(&payload.email).map_err(ApiError::bad_request)?;
    validate_username(&payload.username).map_err(ApiError::bad_request)?;
    validate_password(&payload.password).map_err(ApiError::bad_request)?;

    let taken = state
        .db
        .users()
        .is_taken(&payload.username, &payload.email)
        .await
        .db_err("Failed to check username availability")?;
    if taken {
        return Err(ApiError::bad_request(ALREADY_REGISTERED));
    }

    let password_hash = hash_password_async(payload.password).await.map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ApiError::internal("Failed to create user")
    })?;

    if let Some(avatar) = &avatar {
        state.avatars.save(avatar).await?;
    }
    let avatar_name = avatar.as_ref().map(|a| a.stored_name.as_str());

    let created = state
        .db
        .users()
        .create(&NewUser {
            username: &payload.username,
            email: &payload.email,
            password_hash: &password_hash,
            avatar: avatar_name,
        })
        .await;

    let id = match created {
        Ok(id) => id,
        Err(e) => {
            if let Some(name) = avatar_name {
                state.avatars.remove(name).await;
            }
            // Lost a race with a concurrent signup for the same name
            if e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                return Err(ApiError::bad_request(ALREADY_REGISTERED));
            }
            return Err(ApiError::db_error("Failed to create user", e));
        }
    };

    info!(user_id = id, "User registered");
    let identity = Identity {
        id,
        username: payload.username,
        is_admin: false,
        avatar: avatar_name.map(str::to_string),
    };
    start_session(
        &state,
        identity,
        secure,
        StatusCode::CREATED,
        "Registered successfully",
    )
}

async fn logout(State(state): State<AuthApiState>, Auth(identity): Auth) -> Response {
    info!(user_id = identity.id, "User logged out");
    let mut response = Json(SuccessResponse {
        success: "Logged out successfully",
    })
    .into_response();
    // Takes precedence over the renewal queued by `Auth`
    state.settings.cookie.clear(&mut response);
    response
}
