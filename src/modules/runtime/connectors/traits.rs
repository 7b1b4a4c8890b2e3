//! Connector and driver trait definitions

use async_trait::async_trait;
use quarry_core::{DriverError, QuarryError};
use quarry_types::{ConnectionParameters, ResultSet, SystemId};

/// Introspection statement plus the result column holding the names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Introspection {
    /// Statement to execute
    pub statement: String,
    /// Zero-based column projected into the returned names
    pub column: usize,
}

impl Introspection {
    pub fn new(statement: impl Into<String>, column: usize) -> Self {
        Self {
            statement: statement.into(),
            column,
        }
    }
}

/// Vendor plugin contract
///
/// A driver knows how to open, probe, close and query one kind of database.
/// It never tracks connection state itself; [`DriverConnector`] owns the
/// handle and the lifecycle rules.
///
/// [`DriverConnector`]: super::DriverConnector
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Native session handle
    type Handle: Send + Sync + 'static;

    /// Parameters that must be present before a connector can be built
    fn required_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    /// Open a new native session
    async fn create_connection(
        &self,
        params: &ConnectionParameters,
    ) -> Result<Self::Handle, DriverError>;

    /// Liveness probe for a held session
    async fn is_valid_connection(&self, handle: &Self::Handle) -> bool;

    /// Release a native session
    async fn close_connection(&self, handle: &Self::Handle) -> Result<(), DriverError>;

    /// Execute a statement against a live session, bypassing any cache
    async fn run_query(&self, handle: &Self::Handle, query: &str)
        -> Result<ResultSet, DriverError>;

    /// Statements run once a session is configured, e.g. role or warehouse selection
    fn session_statements(&self, _params: &ConnectionParameters) -> Vec<String> {
        Vec::new()
    }

    /// Statement listing databases, and the column holding each name
    fn databases_query(&self) -> Introspection;

    /// Statement listing the schemas of `database`
    fn schemas_query(&self, database: &str) -> Introspection;

    /// Statement listing the tables of `database.schema`
    fn tables_query(&self, database: &str, schema: &str) -> Introspection;

    /// Statement listing the columns of a table; the projected column holds column names
    fn columns_query(&self, database: &str, schema: &str, table: &str) -> Introspection;
}

/// Trait for database connectors
///
/// All connectors implement this trait to give callers a uniform way to
/// connect, introspect and query regardless of the database vendor.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Identifier of the system this connector talks to
    fn system(&self) -> &SystemId;

    /// Establish the session; no-op when already connected
    async fn connect(&self) -> Result<(), QuarryError>;

    /// Release the session; no-op when not connected
    async fn disconnect(&self) -> Result<(), QuarryError>;

    /// True iff a session is held and passes the driver's liveness probe
    async fn is_connected(&self) -> bool;

    /// Execute a statement, connecting first if needed
    async fn execute_query(&self, query: &str) -> Result<ResultSet, QuarryError>;

    /// Run the driver's session setup statements
    async fn configure_session(&self) -> Result<(), QuarryError>;

    async fn list_databases(&self) -> Result<Vec<String>, QuarryError>;

    async fn list_schemas(&self, database: &str) -> Result<Vec<String>, QuarryError>;

    async fn list_tables(&self, database: &str, schema: &str) -> Result<Vec<String>, QuarryError>;

    async fn list_columns(
        &self,
        database: &str,
        schema: &str,
        table: &str,
    ) -> Result<Vec<String>, QuarryError>;
}
