//! # Userhub Repository
//!
//! Data access for users.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn UserRepository>
//! MySqlUserRepository           (SQLx)
//!   ↓
//! MySQL
//! ```
//!
//! [`InMemoryUserRepository`] implements the same trait over a map and backs
//! the service and HTTP tests.

pub mod memory;
pub mod mysql;
pub mod pool;
pub mod traits;

pub use memory::*;
pub use mysql::*;
pub use pool::*;
pub use traits::*;
