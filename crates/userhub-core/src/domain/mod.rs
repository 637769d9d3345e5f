//! Domain types for users.

pub mod email;
pub mod user;

pub use email::*;
pub use user::*;
