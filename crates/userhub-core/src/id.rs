//! Typed ID wrapper for users.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::num::ParseIntError;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a path segment is not a valid user id.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserIdError {
    /// The value is not an integer.
    #[error("ID must be an integer: {0}")]
    NotAnInteger(#[from] ParseIntError),
    /// The value is zero or negative.
    #[error("ID must be a positive integer")]
    NotPositive,
}

/// A strongly-typed wrapper for store-assigned user IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Parses a user ID, accepting only positive integers.
    pub fn parse(s: &str) -> Result<Self, UserIdError> {
        let id: i64 = s.trim().parse()?;
        if id <= 0 {
            return Err(UserIdError::NotPositive);
        }
        Ok(Self(id))
    }

    /// Returns the inner value.
    #[must_use]
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = UserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}
