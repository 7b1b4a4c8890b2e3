//! Connector lifecycle for Quarry
//!
//! Drivers plug in through the [`Driver`] trait and are registered in a
//! [`DriverRegistry`]. The registry wraps each driver in a [`DriverConnector`]
//! that owns the session and a per-connector [`QueryCache`]. The
//! [`ConnectorManager`] keeps at most one connector per system.

mod cache;
mod connector;
mod guard;
mod manager;
mod registry;
mod traits;

#[cfg(test)]
mod testing;

pub use cache::{QueryCache, SessionId};
pub use connector::DriverConnector;
pub use guard::{with_connector, ConnectorGuard};
pub use manager::{ConnectorManager, ManagerOptions};
pub use registry::{ConnectorConstructor, ConnectorOptions, DriverRegistry};
pub use traits::{Connector, Driver, Introspection};
