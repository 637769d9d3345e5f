//! Result type alias.

use crate::HubError;

/// Result type alias using `HubError`.
pub type HubResult<T> = Result<T, HubError>;
