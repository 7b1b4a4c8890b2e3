//! In-process driver used by the connector, registry and manager tests

use async_trait::async_trait;
use quarry_core::DriverError;
use quarry_types::{ConnectionParameters, ResultSet};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::traits::{Driver, Introspection};

/// Shared counters and switches observed by tests
#[derive(Default)]
pub struct FakeState {
    pub creates: AtomicUsize,
    pub closes: AtomicUsize,
    pub queries: AtomicUsize,
    pub executed: Mutex<Vec<String>>,
    pub fail_create: AtomicBool,
    pub fail_close: AtomicBool,
    pub fail_query: AtomicBool,
    /// Simulates the remote side dropping every open session
    pub remote_down: AtomicBool,
    /// Sessions with a serial up to this value report dead
    pub killed_up_to: AtomicUsize,
    pub responses: Mutex<HashMap<String, ResultSet>>,
}

impl FakeState {
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn set(&self, flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    /// Invalidate every session opened so far; later sessions stay healthy
    pub fn kill_sessions(&self) {
        self.killed_up_to.store(self.creates(), Ordering::SeqCst);
    }

    pub fn respond(&self, query: &str, rows: ResultSet) {
        self.responses
            .lock()
            .unwrap()
            .insert(query.to_string(), rows);
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

pub struct FakeHandle {
    pub serial: usize,
    closed: AtomicBool,
}

/// Driver whose sessions live in memory
#[derive(Clone, Default)]
pub struct FakeDriver {
    pub state: Arc<FakeState>,
    pub required: &'static [&'static str],
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requiring(required: &'static [&'static str]) -> Self {
        Self {
            state: Arc::default(),
            required,
        }
    }
}

/// Two-row `SHOW DATABASES` result with names in the second column
pub fn two_databases() -> ResultSet {
    ResultSet::new(
        vec!["created_on".into(), "name".into()],
        vec![
            vec![json!("2024-01-01"), json!("DB1")],
            vec![json!("2024-01-02"), json!("DB2")],
        ],
    )
}

#[async_trait]
impl Driver for FakeDriver {
    type Handle = FakeHandle;

    fn required_parameters(&self) -> &'static [&'static str] {
        self.required
    }

    async fn create_connection(
        &self,
        _params: &ConnectionParameters,
    ) -> Result<FakeHandle, DriverError> {
        if self.state.fail_create.load(Ordering::SeqCst) {
            return Err(DriverError::new("authentication rejected"));
        }
        let serial = self.state.creates.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(FakeHandle {
            serial,
            closed: AtomicBool::new(false),
        })
    }

    async fn is_valid_connection(&self, handle: &FakeHandle) -> bool {
        !handle.closed.load(Ordering::SeqCst)
            && !self.state.remote_down.load(Ordering::SeqCst)
            && handle.serial > self.state.killed_up_to.load(Ordering::SeqCst)
    }

    async fn close_connection(&self, handle: &FakeHandle) -> Result<(), DriverError> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        handle.closed.store(true, Ordering::SeqCst);
        if self.state.fail_close.load(Ordering::SeqCst) {
            return Err(DriverError::new("close timed out"));
        }
        Ok(())
    }

    async fn run_query(&self, handle: &FakeHandle, query: &str) -> Result<ResultSet, DriverError> {
        if handle.closed.load(Ordering::SeqCst) {
            return Err(DriverError::new("session is closed"));
        }
        self.state.queries.fetch_add(1, Ordering::SeqCst);
        self.state.executed.lock().unwrap().push(query.to_string());
        if self.state.fail_query.load(Ordering::SeqCst) {
            return Err(DriverError::new("SQL compilation error"));
        }
        let responses = self.state.responses.lock().unwrap();
        Ok(responses.get(query).cloned().unwrap_or_default())
    }

    fn session_statements(&self, params: &ConnectionParameters) -> Vec<String> {
        params
            .get("role")
            .map(|role| vec![format!("USE ROLE \"{}\"", role)])
            .unwrap_or_default()
    }

    fn databases_query(&self) -> Introspection {
        Introspection::new("SHOW DATABASES", 1)
    }

    fn schemas_query(&self, database: &str) -> Introspection {
        Introspection::new(format!("SHOW SCHEMAS IN DATABASE {}", database), 1)
    }

    fn tables_query(&self, database: &str, schema: &str) -> Introspection {
        Introspection::new(format!("SHOW TABLES IN SCHEMA {}.{}", database, schema), 1)
    }

    fn columns_query(&self, database: &str, schema: &str, table: &str) -> Introspection {
        Introspection::new(
            format!("SHOW COLUMNS IN TABLE {}.{}.{}", database, schema, table),
            2,
        )
    }
}
