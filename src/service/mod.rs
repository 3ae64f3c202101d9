pub mod quality;
pub mod visualization;

pub use quality::QualityService;
pub use visualization::VisualizationService;

use crate::config::Config;
use crate::error::{KinshipError, Result};
use crate::kinship::{CancellationFlag, FamilyGraph, TraversalBudget};
use crate::store::{EntityStore, Snapshot};
use crate::types::Person;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Shared plumbing for request-scoped graph work: one snapshot, one index and
/// one traversal budget per request, nothing kept afterwards.
#[derive(Clone)]
pub struct KinshipContext {
    store: Arc<dyn EntityStore>,
    config: Arc<Config>,
}

impl KinshipContext {
    pub fn new(store: Arc<dyn EntityStore>, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Look a person up at the boundary so missing handles fail before any traversal
    pub async fn require_person(&self, handle: &str) -> Result<Person> {
        self.store
            .get_person(handle)
            .await?
            .ok_or_else(|| KinshipError::PersonNotFound(handle.to_string()))
    }

    /// Fetch a snapshot, index it and run `operation` on a blocking thread under
    /// the configured node budget and request timeout. On timeout the traversal
    /// is told to stop through its cancellation flag.
    pub async fn run_bounded<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&FamilyGraph, TraversalBudget) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let started = Instant::now();
        let result = self.run_bounded_inner(f).await;
        let elapsed = started.elapsed();

        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!("kinship_requests_total", 1, "operation" => operation, "outcome" => outcome);
        metrics::histogram!("kinship_request_duration_seconds", elapsed.as_secs_f64(), "operation" => operation);

        debug!("{} finished in {:.3}s ({})", operation, elapsed.as_secs_f64(), outcome);
        result
    }

    async fn run_bounded_inner<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&FamilyGraph, TraversalBudget) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let snapshot = Snapshot::fetch(self.store.as_ref()).await?;

        let cancellation = CancellationFlag::new();
        let budget = TraversalBudget {
            max_visited: self.config.traversal.max_visited_nodes,
            cancellation: cancellation.clone(),
        };

        let task = tokio::task::spawn_blocking(move || {
            let graph = FamilyGraph::from_snapshot(snapshot);
            f(&graph, budget)
        });

        let seconds = self.config.server.request_timeout_seconds;
        match timeout(Duration::from_secs(seconds), task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(KinshipError::TaskFailed(join_error.to_string())),
            Err(_) => {
                warn!("Traversal exceeded {}s, cancelling", seconds);
                cancellation.cancel();
                Err(KinshipError::Timeout { seconds })
            }
        }
    }
}
