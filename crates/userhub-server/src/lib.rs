//! # Userhub Server Library
//!
//! Resource wiring, logging setup and startup output for the server binary.

pub mod logging;
pub mod resources;
pub mod startup;

pub use logging::init_logging;
pub use resources::Resources;
