//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

/// Internal auth error kind used by the session policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// No session cookie on a route that requires one
    NotAuthenticated,
    /// Session cookie present but malformed, forged or expired
    InvalidToken,
    /// A renewed token could not be issued or handed to the response layer
    RenewalFailed,
}

/// API authentication errors (returns JSON).
#[derive(Debug)]
pub struct ApiAuthError(pub(super) AuthErrorKind);

impl ApiAuthError {
    pub fn kind(&self) -> AuthErrorKind {
        self.0
    }

    fn status_code(&self) -> StatusCode {
        match self.0 {
            AuthErrorKind::NotAuthenticated | AuthErrorKind::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthErrorKind::RenewalFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self.0 {
            AuthErrorKind::NotAuthenticated => "Authorization required",
            AuthErrorKind::InvalidToken => "Invalid or expired authorization",
            AuthErrorKind::RenewalFailed => "Failed to renew session",
        }
    }
}

impl From<AuthErrorKind> for ApiAuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self(kind)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}

/// Rejection for routes reserved to anonymous visitors.
#[derive(Debug)]
pub enum AnonymousRejection {
    /// Send the already-authenticated client elsewhere
    Redirect(&'static str),
    /// Refuse with 409 and a JSON error
    Conflict,
}

impl IntoResponse for AnonymousRejection {
    fn into_response(self) -> Response {
        match self {
            AnonymousRejection::Redirect(location) => Redirect::to(location).into_response(),
            AnonymousRejection::Conflict => (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "Already authenticated",
                }),
            )
                .into_response(),
        }
    }
}
