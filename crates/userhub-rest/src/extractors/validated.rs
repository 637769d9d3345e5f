//! Validated JSON extractor for automatic request validation.
//!
//! `ValidatedJson<T>` deserializes the body and runs the `validator` rules
//! on it. Both malformed JSON and rule violations are answered with
//! 400 Bad Request; violations carry field-level details.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use userhub_core::{field_errors, ErrorResponse, HubError};
use validator::{Validate, ValidationErrors};

/// JSON extractor that validates the deserialized value.
///
/// ```ignore
/// async fn create(ValidatedJson(request): ValidatedJson<CreateUserRequest>) {
///     // request passed every rule on CreateUserRequest
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T> std::ops::Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Rejection type for validated JSON extraction.
#[derive(Debug)]
pub enum ValidatedJsonRejection {
    /// Body was not JSON or did not match the expected shape.
    JsonError(JsonRejection),
    /// Body parsed but broke one or more rules.
    ValidationError(ValidationErrors),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let error_response = match self {
            Self::JsonError(rejection) => {
                debug!("Rejected malformed JSON body: {}", rejection.body_text());
                ErrorResponse {
                    code: "INVALID_JSON".to_string(),
                    message: format!("Invalid JSON: {}", rejection.body_text()),
                    details: None,
                }
            }
            Self::ValidationError(errors) => {
                debug!("Rejected invalid request body: {}", errors);
                let error = HubError::Validation("Request validation failed".to_string());
                ErrorResponse::from_error(&error).with_details(field_errors(&errors))
            }
        };

        (StatusCode::BAD_REQUEST, Json(error_response)).into_response()
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::JsonError)?;

        value
            .validate()
            .map_err(ValidatedJsonRejection::ValidationError)?;

        Ok(Self(value))
    }
}
