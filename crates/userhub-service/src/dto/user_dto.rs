//! User-related DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use userhub_core::rules::not_blank;
use userhub_core::{UserId, UserProfile};
use utoipa::ToSchema;
use validator::Validate;

/// Request to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(custom(function = "not_blank", message = "Name must not be empty"))]
    #[schema(example = "Test User")]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    #[schema(example = "test@example.com")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "password123")]
    pub password: String,
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(custom(function = "not_blank", message = "Name must not be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

/// User response DTO. Carries no password material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for UserResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.into(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Confirmation body for deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "User 1 deleted")]
    pub message: String,
}

impl MessageResponse {
    /// Message returned after a user is deleted.
    #[must_use]
    pub fn user_deleted(id: UserId) -> Self {
        Self {
            message: format!("User {id} deleted"),
        }
    }
}
