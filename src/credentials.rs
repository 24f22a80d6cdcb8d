//! Username/password verification.

use std::future::Future;

use tokio::sync::OnceCell;
use tracing::{error, warn};

use crate::auth::Identity;
use crate::db::Database;
use crate::password::{PasswordError, hash_password_async, verify_password_async};

/// Hash checked when the username does not exist, so both failure paths cost the same.
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

async fn dummy_hash() -> Result<&'static str, PasswordError> {
    DUMMY_HASH
        .get_or_try_init(|| hash_password_async("dummy-password-for-timing".to_string()))
        .await
        .map(String::as_str)
}

/// Compute the unknown-user hash before the first login attempt needs it.
pub async fn prepare_credential_check() -> Result<(), PasswordError> {
    dummy_hash().await.map(|_| ())
}

/// Why a credential check did not produce an identity.
#[derive(Debug)]
pub enum AuthFailure {
    /// Unknown username or wrong password. Not retryable.
    BadCredentials,
    /// Storage or hashing backend failed. Retryable.
    Unavailable(String),
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailure::BadCredentials => write!(f, "Incorrect username or password"),
            AuthFailure::Unavailable(reason) => {
                write!(f, "Credential check unavailable: {}", reason)
            }
        }
    }
}

impl std::error::Error for AuthFailure {}

/// Checks submitted credentials and yields the identity to embed in a new session.
pub trait CredentialVerifier {
    fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, AuthFailure>> + Send;
}

impl CredentialVerifier for Database {
    fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, AuthFailure>> + Send {
        let users = self.users();
        let username = username.to_string();
        let password = password.to_string();

        async move {
            let user = users.get_by_username(&username).await.map_err(|e| {
                error!(error = %e, "Failed to look up user for login");
                AuthFailure::Unavailable(e.to_string())
            })?;

            let Some(user) = user else {
                let dummy = dummy_hash().await.map_err(|e| {
                    error!(error = %e, "Failed to prepare unknown-user hash");
                    AuthFailure::Unavailable(e.to_string())
                })?;
                // Burn the same hashing time as a real check
                let _ = verify_password_async(password, dummy.to_string()).await;
                return Err(AuthFailure::BadCredentials);
            };

            match verify_password_async(password, user.password_hash.clone()).await {
                Ok(true) => Ok(user.identity()),
                Ok(false) => Err(AuthFailure::BadCredentials),
                Err(PasswordError::Worker) => {
                    error!("Password verification worker failed");
                    Err(AuthFailure::Unavailable("hashing worker failed".to_string()))
                }
                Err(e) => {
                    warn!(user_id = user.id, error = %e, "Stored password hash is unusable");
                    Err(AuthFailure::BadCredentials)
                }
            }
        }
    }
}
