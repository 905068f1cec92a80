//! History table loading and periodic reload.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::data::TableSnapshot;
use crate::error::FetchError;

use super::MetricFetcher;

/// Outcome of one table load.
pub type TableUpdate = Result<TableSnapshot, FetchError>;

/// The table's binding to its remote data source.
#[derive(Clone)]
pub struct TableView {
    fetcher: Arc<dyn MetricFetcher>,
    path: String,
    sender: mpsc::UnboundedSender<TableUpdate>,
}

impl std::fmt::Debug for TableView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableView").field("path", &self.path).finish()
    }
}

impl TableView {
    pub fn new(
        fetcher: Arc<dyn MetricFetcher>,
        path: impl Into<String>,
        sender: mpsc::UnboundedSender<TableUpdate>,
    ) -> Self {
        Self {
            fetcher,
            path: path.into(),
            sender,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fetch and parse the table, then publish the outcome.
    pub async fn reload(&self) {
        let result = match self.fetcher.fetch(&self.path).await {
            Ok(body) => TableSnapshot::from_json(&body),
            Err(e) => Err(e),
        };
        if let Err(ref e) = result {
            warn!(path = %self.path, error = %e, "table load failed");
        }
        let _ = self.sender.send(result);
    }

    /// Spawn a single reload on `runtime`.
    pub fn spawn_reload(&self, runtime: &Handle) -> JoinHandle<()> {
        let view = self.clone();
        runtime.spawn(async move { view.reload().await })
    }
}

/// Triggers periodic table reloads.
pub struct TableRefresher;

impl TableRefresher {
    /// Reload `view` every `period`, first one a full period from now.
    ///
    /// The view's initial load is not triggered here. Must be called from
    /// within a tokio runtime.
    pub fn spawn(view: TableView, period: Duration) -> RefreshHandle {
        let runtime = Handle::current();
        let period = period.max(Duration::from_millis(1));
        let timer_view = view.clone();
        let timer_runtime = runtime.clone();
        debug!(path = view.path(), ?period, "starting table refresher");

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                timer_view.spawn_reload(&timer_runtime);
            }
        });

        RefreshHandle {
            runtime,
            view,
            task,
        }
    }
}

/// A running table refresher.
#[derive(Debug)]
pub struct RefreshHandle {
    runtime: Handle,
    view: TableView,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Reload now, outside the regular cadence.
    pub fn reload_now(&self) {
        self.view.spawn_reload(&self.runtime);
    }

    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
