//! Repository trait definitions.

use async_trait::async_trait;
use userhub_core::{HubResult, NewUser, UserChanges, UserId, UserProfile};

/// User repository trait.
///
/// Every read returns [`UserProfile`], which has no password field; the hash
/// is write-only from the service's point of view.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by ID.
    async fn find_by_id(&self, id: UserId) -> HubResult<Option<UserProfile>>;

    /// Returns every user, oldest first.
    async fn find_all(&self) -> HubResult<Vec<UserProfile>>;

    /// Checks if an email is already registered.
    async fn exists_by_email(&self, email: &str) -> HubResult<bool>;

    /// Inserts a new user and returns the stored record.
    ///
    /// A duplicate email surfaces as `HubError::Conflict`.
    async fn insert(&self, user: &NewUser) -> HubResult<UserProfile>;

    /// Applies a partial update. Returns `None` if the user does not exist.
    async fn update(&self, id: UserId, changes: &UserChanges) -> HubResult<Option<UserProfile>>;

    /// Deletes a user by ID. Returns whether a row was removed.
    async fn delete(&self, id: UserId) -> HubResult<bool>;
}
