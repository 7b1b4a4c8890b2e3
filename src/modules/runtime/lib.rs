//! Connection runtime for Quarry
//!
//! This crate provides the driver registry, cached connectors and the
//! connector manager that owns one connection per database system.

pub mod connectors;

pub use connectors::{
    with_connector, Connector, ConnectorGuard, ConnectorManager, ConnectorOptions, Driver,
    DriverConnector, DriverRegistry, Introspection, ManagerOptions, QueryCache,
};
