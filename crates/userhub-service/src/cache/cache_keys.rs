//! Cache key generators for consistent key naming.
//!
//! Keys are unprefixed so that entries stay interchangeable with other
//! clients of the same Redis database.

use userhub_core::UserId;

/// Key holding the full user list.
pub const ALL_USERS: &str = "all_users";

/// Generate a cache key for a user by ID.
#[must_use]
pub fn user_by_id(id: UserId) -> String {
    format!("user_{id}")
}

/// Every key a write to `id` must invalidate.
#[must_use]
pub fn invalidated_by_write(id: UserId) -> [String; 2] {
    [user_by_id(id), ALL_USERS.to_string()]
}
