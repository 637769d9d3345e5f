//! User service trait definition.

use crate::dto::{CreateUserRequest, MessageResponse, UpdateUserRequest, UserResponse};
use async_trait::async_trait;
use userhub_core::{HubResult, UserId};

/// User service trait.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Creates a new user.
    async fn create(&self, request: CreateUserRequest) -> HubResult<UserResponse>;

    /// Lists every user.
    async fn find_all(&self) -> HubResult<Vec<UserResponse>>;

    /// Gets a user by ID. Absence is not an error at this layer.
    async fn find_one(&self, id: UserId) -> HubResult<Option<UserResponse>>;

    /// Applies a partial update.
    async fn update(&self, id: UserId, request: UpdateUserRequest) -> HubResult<UserResponse>;

    /// Deletes a user.
    async fn remove(&self, id: UserId) -> HubResult<MessageResponse>;
}
