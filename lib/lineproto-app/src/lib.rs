//! High-level application primitives.
//!
//! This crate provides what an application needs before it starts producing points: loading configuration, initializing
//! logging, and setting up the point builder pool.
#![deny(warnings)]
#![deny(missing_docs)]

pub mod bootstrap;
pub mod logging;

/// Common imports.
pub mod prelude {
    pub use super::bootstrap::{initialize_point_pool, load_configuration};
    pub use super::logging::{fatal_and_exit, initialize_logging, LoggingConfiguration};
}
