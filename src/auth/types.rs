//! Authentication user types.

use serde::{Deserialize, Serialize};

/// Identity snapshot embedded in a session token.
///
/// Taken once at login or signup and carried by value from then on; the
/// session layer never re-reads it from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Database user ID
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    /// Stored avatar file name, if the user uploaded one
    pub avatar: Option<String>,
}

impl Identity {
    /// Whether this identity may modify a resource owned by `owner_id`.
    pub fn can_modify(&self, owner_id: i64) -> bool {
        self.is_admin || self.id == owner_id
    }
}
