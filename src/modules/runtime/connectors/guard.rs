//! Scoped acquisition: connect on enter, disconnect on every exit path

use quarry_core::Result;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use super::traits::Connector;

/// A connected connector that is disconnected when the scope ends
///
/// Call [`release`](Self::release) to disconnect and observe the outcome.
/// A guard dropped without release (early return, panic, cancelled future)
/// schedules a best-effort disconnect on the current tokio runtime.
pub struct ConnectorGuard {
    connector: Arc<dyn Connector>,
    released: bool,
}

impl ConnectorGuard {
    /// Connect `connector` and guard it
    pub async fn acquire(connector: Arc<dyn Connector>) -> Result<Self> {
        connector.connect().await?;
        Ok(Self {
            connector,
            released: false,
        })
    }

    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    /// Disconnect and end the scope
    pub async fn release(mut self) -> Result<()> {
        let result = self.connector.disconnect().await;
        self.released = true;
        result
    }
}

impl Deref for ConnectorGuard {
    type Target = dyn Connector;

    fn deref(&self) -> &Self::Target {
        self.connector.as_ref()
    }
}

impl Drop for ConnectorGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let system = self.connector.system().clone();
        tracing::warn!(system = %system, "connector guard dropped without release");

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let connector = self.connector.clone();
                runtime.spawn(async move {
                    if let Err(e) = connector.disconnect().await {
                        tracing::warn!(system = %system, error = %e, "deferred disconnect failed");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(system = %system, "no runtime available for deferred disconnect");
            }
        }
    }
}

/// Run `f` with `connector` connected, disconnecting afterwards
///
/// The error from `f` takes precedence over a disconnect error.
pub async fn with_connector<F, Fut, T>(connector: Arc<dyn Connector>, f: F) -> Result<T>
where
    F: FnOnce(Arc<dyn Connector>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let guard = ConnectorGuard::acquire(connector).await?;
    let outcome = f(guard.connector().clone()).await;
    let released = guard.release().await;

    let value = outcome?;
    released?;
    Ok(value)
}
