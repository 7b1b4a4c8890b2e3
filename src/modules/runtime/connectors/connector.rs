//! Lifecycle glue shared by every driver

use async_trait::async_trait;
use quarry_core::{QuarryError, Result};
use quarry_types::{ConnectionParameters, ResultSet, SystemId};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::cache::{QueryCache, SessionId};
use super::traits::{Connector, Driver, Introspection};

/// A live native handle tagged with the identity used as cache namespace
struct Session<H> {
    id: SessionId,
    handle: H,
}

/// Connector built from a [`Driver`]
///
/// Holds at most one session. The session slot is locked across session
/// creation so concurrent `connect` calls never open two sessions; queries
/// clone the session and run without holding the lock.
pub struct DriverConnector<D: Driver> {
    system: SystemId,
    driver: Arc<D>,
    params: ConnectionParameters,
    cache: QueryCache,
    session: Mutex<Option<Arc<Session<D::Handle>>>>,
}

impl<D: Driver> DriverConnector<D> {
    /// Create a disconnected connector, checking the driver's required parameters
    pub fn new(
        system: impl Into<SystemId>,
        driver: D,
        params: ConnectionParameters,
        cache: QueryCache,
    ) -> Result<Self> {
        let system = system.into();
        let missing = params.missing(driver.required_parameters());
        if !missing.is_empty() {
            return Err(QuarryError::MissingParameter {
                system: system.to_string(),
                missing,
            });
        }

        Ok(Self {
            system,
            driver: Arc::new(driver),
            params,
            cache,
            session: Mutex::new(None),
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn parameters(&self) -> &ConnectionParameters {
        &self.params
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Identity of the held session, if any (valid or not)
    pub async fn session_id(&self) -> Option<SessionId> {
        self.session.lock().await.as_ref().map(|s| s.id)
    }

    /// Return a validated session, opening a new one if needed
    async fn ensure_session(&self) -> Result<Arc<Session<D::Handle>>> {
        let mut slot = self.session.lock().await;

        if let Some(current) = slot.as_ref() {
            if self.driver.is_valid_connection(&current.handle).await {
                return Ok(current.clone());
            }
        }

        if let Some(stale) = slot.take() {
            tracing::debug!(system = %self.system, session = %stale.id, "releasing stale session");
            self.close_session(&stale).await;
        }

        let handle = self
            .driver
            .create_connection(&self.params)
            .await
            .map_err(|e| QuarryError::connection(self.system.as_str(), e))?;
        let session = Arc::new(Session {
            id: Uuid::new_v4(),
            handle,
        });

        if let Err(e) = self.run_session_statements(&session).await {
            self.close_session(&session).await;
            return Err(QuarryError::connection(self.system.as_str(), e));
        }

        tracing::info!(system = %self.system, session = %session.id, "connected");
        *slot = Some(session.clone());
        Ok(session)
    }

    async fn run_session_statements(&self, session: &Session<D::Handle>) -> Result<()> {
        for statement in self.driver.session_statements(&self.params) {
            tracing::debug!(system = %self.system, statement = %statement, "configuring session");
            self.driver
                .run_query(&session.handle, &statement)
                .await
                .map_err(|e| QuarryError::invalid_query(self.system.as_str(), e))?;
        }
        Ok(())
    }

    /// Best-effort close; the caller has already detached the session
    async fn close_session(&self, session: &Session<D::Handle>) {
        self.cache.invalidate_session(session.id);
        if let Err(e) = self.driver.close_connection(&session.handle).await {
            tracing::warn!(
                system = %self.system,
                session = %session.id,
                error = %e,
                "failed to close session cleanly"
            );
        }
    }

    async fn list(&self, introspection: Introspection) -> Result<Vec<String>> {
        let rows = self.execute_query(&introspection.statement).await?;
        rows.project(introspection.column).map_err(|row| {
            QuarryError::invalid_query(
                self.system.as_str(),
                format!(
                    "row {} of '{}' has no column {}",
                    row, introspection.statement, introspection.column
                ),
            )
        })
    }
}

#[async_trait]
impl<D: Driver> Connector for DriverConnector<D> {
    fn system(&self) -> &SystemId {
        &self.system
    }

    async fn connect(&self) -> Result<()> {
        self.ensure_session().await.map(|_| ())
    }

    async fn disconnect(&self) -> Result<()> {
        let detached = self.session.lock().await.take();
        if let Some(session) = detached {
            self.close_session(&session).await;
            tracing::info!(system = %self.system, session = %session.id, "disconnected");
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        let current = self.session.lock().await.clone();
        match current {
            Some(session) => self.driver.is_valid_connection(&session.handle).await,
            None => false,
        }
    }

    async fn execute_query(&self, query: &str) -> Result<ResultSet> {
        let system = self.system.as_str();
        let session = self
            .ensure_session()
            .await
            .map_err(|e| QuarryError::invalid_query(system, e))?;

        let driver: &D = &self.driver;
        let handle = &session.handle;
        let rows = self
            .cache
            .execute(session.id, query, move || driver.run_query(handle, query))
            .await
            .map_err(|e| QuarryError::invalid_query(system, e))?;

        Ok(rows.as_ref().clone())
    }

    async fn configure_session(&self) -> Result<()> {
        let session = self.ensure_session().await?;
        self.run_session_statements(&session).await
    }

    async fn list_databases(&self) -> Result<Vec<String>> {
        self.list(self.driver.databases_query()).await
    }

    async fn list_schemas(&self, database: &str) -> Result<Vec<String>> {
        self.list(self.driver.schemas_query(database)).await
    }

    async fn list_tables(&self, database: &str, schema: &str) -> Result<Vec<String>> {
        self.list(self.driver.tables_query(database, schema)).await
    }

    async fn list_columns(&self, database: &str, schema: &str, table: &str) -> Result<Vec<String>> {
        self.list(self.driver.columns_query(database, schema, table))
            .await
    }
}

impl<D: Driver> Drop for DriverConnector<D> {
    fn drop(&mut self) {
        let Some(session) = self.session.get_mut().take() else {
            return;
        };

        tracing::warn!(
            system = %self.system,
            session = %session.id,
            "connector dropped while connected; releasing session"
        );
        self.cache.invalidate_session(session.id);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let driver = self.driver.clone();
                let system = self.system.clone();
                runtime.spawn(async move {
                    if let Err(e) = driver.close_connection(&session.handle).await {
                        tracing::warn!(system = %system, error = %e, "failed to close dropped session");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(system = %self.system, "no runtime available to close dropped session");
            }
        }
    }
}

impl<D: Driver> std::fmt::Debug for DriverConnector<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverConnector")
            .field("system", &self.system)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
