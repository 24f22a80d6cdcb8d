//! Authentication state traits and macro.

use super::client::SecureCookies;
use super::cookie::CookieBinder;
use crate::jwt::JwtConfig;

/// Immutable session settings built once at startup.
#[derive(Debug, Clone, Default)]
pub struct ServerSettings {
    pub cookie: CookieBinder,
    pub secure_cookies: SecureCookies,
    /// Trust `X-Forwarded-*` headers from a reverse proxy
    pub trust_proxy: bool,
}

/// Trait for state types that provide the token codec and session settings.
pub trait HasAuthBackend {
    fn jwt(&self) -> &JwtConfig;
    fn settings(&self) -> &ServerSettings;
}

/// Macro to implement `HasAuthBackend` for state structs with the standard fields.
///
/// The struct must have these fields:
/// - `jwt: Arc<JwtConfig>`
/// - `settings: Arc<ServerSettings>`
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_backend;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub jwt: Arc<JwtConfig>,
///     pub settings: Arc<ServerSettings>,
///     // ... other fields
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            fn jwt(&self) -> &$crate::jwt::JwtConfig {
                &self.jwt
            }
            fn settings(&self) -> &$crate::auth::ServerSettings {
                &self.settings
            }
        }
    };
}
