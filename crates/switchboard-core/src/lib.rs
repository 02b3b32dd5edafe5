//! # Switchboard Core
//!
//! Core types shared by every crate of the Switchboard state layer:
//! the store/cache error taxonomy, typed identifiers, and tracing setup.

pub mod error;
pub mod id;
pub mod telemetry;

pub use error::*;
pub use id::*;
