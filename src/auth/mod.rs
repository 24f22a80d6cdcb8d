//! Stateless cookie sessions.
//!
//! The session cookie carries a signed JWT embedding the user's identity.
//! Every successful check issues a fresh token (rolling renewal), which the
//! `apply_session_cookie` layer binds to the response. Three policies gate
//! requests: `Auth` (must be signed in), `Anonymous` (must not be) and
//! `MaybeAuth` (identify if possible).

mod client;
mod cookie;
mod errors;
mod extractors;
mod session;
mod state;
mod types;

pub use client::{
    HasHeadersAndExtensions, SecureCookies, SecureTransport, extract_client_ip, is_secure_request,
};
pub use cookie::{CookieBinder, SESSION_COOKIE_NAME, get_cookie};
pub use errors::{AnonymousRejection, ApiAuthError, AuthErrorKind};
pub use extractors::{Anonymous, AnonymousPolicy, Auth, Conflict, MaybeAuth, RedirectHome};
pub use session::{
    PendingSession, RENEWED_SESSION, SessionCheck, apply_session_cookie, authenticate_request,
    check_session, renew_session,
};
pub use state::{HasAuthBackend, ServerSettings};
pub use types::Identity;
