//! Password hashing using Argon2.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2, Params,
};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use userhub_core::{HubError, HubResult};

/// Interface for password hashing operations.
pub trait PasswordHasherInterface: Send + Sync {
    /// Hashes a password.
    fn hash(&self, password: &str) -> HubResult<String>;

    /// Verifies a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> HubResult<bool>;
}

/// Password hasher service using Argon2id.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Arc<Argon2<'static>>,
}

impl PasswordHasher {
    /// Creates a new password hasher with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(Params::DEFAULT)
    }

    /// Creates a new password hasher with custom parameters.
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
        Self {
            argon2: Arc::new(argon2),
        }
    }

    /// Creates a password hasher from a cost parameter (memory cost in MiB).
    ///
    /// Out-of-range costs fall back to the library defaults.
    #[must_use]
    pub fn with_cost(cost: u32) -> Self {
        let params = Params::new(
            cost.saturating_mul(1024), // Memory cost in KiB
            3,                         // Time cost (iterations)
            1,                         // Parallelism
            None,                      // Output length (default)
        )
        .unwrap_or(Params::DEFAULT);

        Self::with_params(params)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

impl PasswordHasherInterface for PasswordHasher {
    fn hash(&self, password: &str) -> HubResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HubError::Internal(format!("Failed to hash password: {e}")))?;

        debug!("Password hashed successfully");
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> HubResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| HubError::Internal(format!("Invalid password hash format: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password verification failed: incorrect password");
                Ok(false)
            }
            Err(e) => Err(HubError::Internal(format!("Password verification error: {e}"))),
        }
    }
}
