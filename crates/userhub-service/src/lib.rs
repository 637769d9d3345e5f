//! # Userhub Service
//!
//! Business logic for user management: store writes with cache invalidation
//! and cache-aside reads.

pub mod cache;
pub mod dto;
pub mod r#impl;
pub mod user_service;

pub use cache::*;
pub use dto::*;
pub use r#impl::UserServiceImpl;
pub use user_service::*;
