//! Normalized email addresses.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use validator::ValidateEmail;

/// Rejected address, as it looked after normalization.
#[derive(Debug, Error)]
#[error("Invalid email address: {0}")]
pub struct EmailError(String);

fn normalize(raw: impl Into<String>) -> String {
    raw.into().trim().to_lowercase()
}

/// Lower-case, whitespace-trimmed email.
///
/// Two addresses that differ only in case compare equal, which is what the
/// unique-email rule relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Normalizes `raw` and checks its syntax.
    pub fn new(raw: impl Into<String>) -> Result<Self, EmailError> {
        let email = normalize(raw);
        if email.validate_email() {
            Ok(Self(email))
        } else {
            Err(EmailError(email))
        }
    }

    /// Skips the syntax check. For values read back from the `users` table.
    #[must_use]
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(normalize(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
