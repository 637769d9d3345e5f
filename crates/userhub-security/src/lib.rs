//! # Userhub Security
//!
//! Password hashing for Userhub. Plain-text passwords never leave this crate
//! other than as an Argon2id PHC string.

pub mod password;

pub use password::*;
