//! Axum extractors implementing the three session policies.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::{AnonymousRejection, ApiAuthError, AuthErrorKind};
use super::session::{SessionCheck, authenticate_request, check_session};
use super::state::HasAuthBackend;
use super::types::Identity;

/// Extractor for endpoints that require a valid session.
///
/// Rejects with 401 when the cookie is missing or invalid. On success the
/// session is renewed and the fresh cookie is bound by the session layer.
pub struct Auth(pub Identity);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate_request(parts, state)
            .map(Auth)
            .map_err(ApiAuthError::from)
    }
}

/// Optional authentication extractor.
///
/// Token problems are swallowed and yield `None`. Only a failed renewal of a
/// valid session rejects the request.
pub struct MaybeAuth(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match authenticate_request(parts, state) {
            Ok(identity) => Ok(MaybeAuth(Some(identity))),
            Err(AuthErrorKind::RenewalFailed) => Err(ApiAuthError(AuthErrorKind::RenewalFailed)),
            Err(AuthErrorKind::NotAuthenticated | AuthErrorKind::InvalidToken) => {
                Ok(MaybeAuth(None))
            }
        }
    }
}

/// How an anonymous-only route turns away a client that is already signed in.
pub trait AnonymousPolicy: Send + Sync + 'static {
    fn reject() -> AnonymousRejection;
}

/// Redirect signed-in clients to the home page.
pub struct RedirectHome;

impl AnonymousPolicy for RedirectHome {
    fn reject() -> AnonymousRejection {
        AnonymousRejection::Redirect("/")
    }
}

/// Refuse signed-in clients with 409 Conflict.
pub struct Conflict;

impl AnonymousPolicy for Conflict {
    fn reject() -> AnonymousRejection {
        AnonymousRejection::Conflict
    }
}

/// Extractor for endpoints reserved to visitors without a valid session.
///
/// Missing or invalid tokens pass; a valid token is rejected per `P`. The
/// session is not renewed.
pub struct Anonymous<P: AnonymousPolicy = RedirectHome>(PhantomData<P>);

impl<S, P> FromRequestParts<S> for Anonymous<P>
where
    S: HasAuthBackend + Send + Sync,
    P: AnonymousPolicy,
{
    type Rejection = AnonymousRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match check_session(parts, state) {
            SessionCheck::Authenticated(identity) => {
                tracing::debug!(user_id = identity.id, "Signed-in client hit an anonymous-only route");
                Err(P::reject())
            }
            SessionCheck::Anonymous | SessionCheck::Invalid(_) => Ok(Anonymous(PhantomData)),
        }
    }
}
