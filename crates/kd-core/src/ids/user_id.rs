use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Authenticated user identifier.
///
/// Opaque and stable for the lifetime of a session. Every remote read or write
/// of onboarding progress is addressed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl_id!(UserId);

impl UserId {
    /// An identifier is usable as a record key only if it is non-blank.
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}
