//! Session checking, rolling renewal and the response layer that binds renewed cookies.

use std::cell::RefCell;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};

use super::client::is_secure_request;
use super::cookie::get_cookie;
use super::errors::AuthErrorKind;
use super::state::{HasAuthBackend, ServerSettings};
use super::types::Identity;
use crate::jwt::JwtError;

/// Renewed session token waiting to be bound to the response.
#[derive(Debug, Clone)]
pub struct PendingSession {
    pub token: String,
    pub secure: bool,
}

tokio::task_local! {
    /// Task-local slot for the renewed session token.
    /// Filled by the auth extractors, drained by `apply_session_cookie`.
    pub static RENEWED_SESSION: RefCell<Option<PendingSession>>;
}

/// Outcome of inspecting the session cookie, before any policy is applied.
#[derive(Debug)]
pub enum SessionCheck {
    Authenticated(Identity),
    /// No session cookie present
    Anonymous,
    /// Cookie present but rejected by the token codec
    Invalid(JwtError),
}

/// Read and verify the session cookie without renewing it.
pub fn check_session<S: HasAuthBackend>(parts: &Parts, state: &S) -> SessionCheck {
    let name = state.settings().cookie.name();
    let Some(token) = get_cookie(&parts.headers, name) else {
        return SessionCheck::Anonymous;
    };
    if token.is_empty() {
        return SessionCheck::Anonymous;
    }

    match state.jwt().verify(token) {
        Ok(identity) => SessionCheck::Authenticated(identity),
        Err(e) => {
            debug!(error = %e, "Rejected session token");
            SessionCheck::Invalid(e)
        }
    }
}

/// Issue a fresh token for `identity` and queue it for the response layer.
///
/// Fails closed: if the token cannot be issued or the response layer is not
/// installed, the request must not continue on the old token.
pub fn renew_session<S: HasAuthBackend>(
    parts: &Parts,
    state: &S,
    identity: &Identity,
) -> Result<(), AuthErrorKind> {
    let issued = state.jwt().issue(identity).map_err(|e| {
        error!(user_id = identity.id, error = %e, "Failed to issue renewed session token");
        AuthErrorKind::RenewalFailed
    })?;

    let settings = state.settings();
    let pending = PendingSession {
        token: issued.token,
        secure: is_secure_request(parts, settings.secure_cookies, settings.trust_proxy),
    };

    RENEWED_SESSION
        .try_with(|cell| {
            cell.borrow_mut().replace(pending);
        })
        .map_err(|_| {
            error!("Session renewal attempted outside of the session cookie layer");
            AuthErrorKind::RenewalFailed
        })
}

/// Verify the session and renew it. Used by the policies that admit authenticated users.
pub fn authenticate_request<S: HasAuthBackend>(
    parts: &Parts,
    state: &S,
) -> Result<Identity, AuthErrorKind> {
    match check_session(parts, state) {
        SessionCheck::Authenticated(identity) => {
            renew_session(parts, state, &identity)?;
            Ok(identity)
        }
        SessionCheck::Anonymous => Err(AuthErrorKind::NotAuthenticated),
        SessionCheck::Invalid(_) => Err(AuthErrorKind::InvalidToken),
    }
}

/// Middleware that binds a renewed session token to the outgoing response.
///
/// A handler that sets the session cookie itself (login, logout) takes precedence.
pub async fn apply_session_cookie(
    State(settings): State<Arc<ServerSettings>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut response, pending) = RENEWED_SESSION
        .scope(RefCell::new(None), async move {
            let response = next.run(request).await;
            let pending = RENEWED_SESSION.with(|cell| cell.borrow_mut().take());
            (response, pending)
        })
        .await;

    if let Some(pending) = pending {
        if !settings.cookie.is_set_on(&response) {
            settings
                .cookie
                .bind(&mut response, &pending.token, pending.secure);
        }
    }

    response
}
