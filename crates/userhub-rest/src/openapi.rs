//! OpenAPI documentation configuration.

use crate::controllers::{ComponentHealth, HealthResponse, ReadinessResponse};
use userhub_core::{ErrorResponse, FieldError, UserId};
use userhub_service::{CreateUserRequest, MessageResponse, UpdateUserRequest, UserResponse};
use utoipa::OpenApi;

/// OpenAPI documentation for the Userhub API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Userhub API",
        version = "1.0.0",
        description = "User management REST API with a Redis read cache",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    paths(
        // User endpoints
        crate::controllers::user_controller::create_user,
        crate::controllers::user_controller::list_users,
        crate::controllers::user_controller::get_user,
        crate::controllers::user_controller::update_user,
        crate::controllers::user_controller::delete_user,
        // Health endpoints
        crate::controllers::health_controller::health_check,
        crate::controllers::health_controller::readiness_check,
    ),
    components(
        schemas(
            UserId,
            ErrorResponse,
            FieldError,
            CreateUserRequest,
            UpdateUserRequest,
            UserResponse,
            MessageResponse,
            HealthResponse,
            ReadinessResponse,
            ComponentHealth,
        )
    ),
    tags(
        (name = "users", description = "User management endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;
