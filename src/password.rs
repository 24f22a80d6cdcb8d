//! Argon2 password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

#[derive(Debug)]
pub enum PasswordError {
    /// Hashing failed
    Hash(argon2::password_hash::Error),
    /// Stored hash is not a valid PHC string
    InvalidHash(argon2::password_hash::Error),
    /// The blocking worker panicked or was cancelled
    Worker,
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordError::Hash(e) => write!(f, "Failed to hash password: {}", e),
            PasswordError::InvalidHash(e) => write!(f, "Invalid password hash: {}", e),
            PasswordError::Worker => write!(f, "Password hashing worker failed"),
        }
    }
}

impl std::error::Error for PasswordError {}

/// Hash a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(PasswordError::Hash)
}

/// Check a password against a stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(PasswordError::InvalidHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// [`hash_password`] on the blocking thread pool.
pub async fn hash_password_async(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| PasswordError::Worker)?
}

/// [`verify_password`] on the blocking thread pool.
pub async fn verify_password_async(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|_| PasswordError::Worker)?
}
