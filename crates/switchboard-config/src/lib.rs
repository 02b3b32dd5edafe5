//! # Switchboard Config
//!
//! Configuration management for the Switchboard state layer.
//! Supports layered configuration from files and environment variables,
//! with validation of the loaded result.

mod app_config;
mod error;
mod loader;
mod validation;

pub use app_config::*;
pub use error::*;
pub use loader::*;
pub use validation::*;
