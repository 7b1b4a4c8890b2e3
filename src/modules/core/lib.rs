//! Core domain logic for Quarry
//!
//! This crate contains the configuration domain model and the error taxonomy
//! shared by the registry, the connectors and the connector manager.

pub mod domain;
pub mod error;

pub use domain::*;
pub use error::{BoxError, DriverError, QuarryError, Result};
