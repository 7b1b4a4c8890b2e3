//! Type definitions for Quarry
//!
//! This crate contains shared value types used across the Quarry codebase:
//! system identifiers, connection parameters and query result sets.

pub mod parameters;
pub mod result;
pub mod system;

pub use parameters::ConnectionParameters;
pub use result::{ResultSet, Row};
pub use system::SystemId;
