use crate::error::Result;
use crate::kinship::{ConnectivityAnalyzer, GraphStatistics};
use crate::service::KinshipContext;
use crate::types::{Cluster, ClusterReport, DisconnectedReport, PersonSummary};
use tracing::{info, instrument};
use uuid::Uuid;

/// Data-quality checks over the whole population
#[derive(Clone)]
pub struct QualityService {
    context: KinshipContext,
}

impl QualityService {
    pub fn new(context: KinshipContext) -> Self {
        Self { context }
    }

    /// People unreachable from `root`, or from the first person in store order
    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn disconnected(&self, root: Option<String>) -> Result<DisconnectedReport> {
        if let Some(root) = root.as_deref() {
            self.context.require_person(root).await?;
        }

        let report = self
            .context
            .run_bounded("disconnected", move |graph, budget| {
                let analyzer = ConnectivityAnalyzer::new(graph).with_cancellation(budget.cancellation);
                let people = match root.as_deref() {
                    Some(root) => analyzer.find_disconnected_from(root)?,
                    None => analyzer.find_disconnected_branches()?,
                };

                let branches: Vec<PersonSummary> = people.into_iter().map(PersonSummary::from).collect();
                Ok(DisconnectedReport {
                    count: branches.len(),
                    branches,
                })
            })
            .await?;

        info!("{} people disconnected from the main tree", report.count);
        Ok(report)
    }

    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn clusters(&self) -> Result<ClusterReport> {
        self.context
            .run_bounded("clusters", |graph, budget| {
                let clusters: Vec<Cluster> = ConnectivityAnalyzer::new(graph)
                    .with_cancellation(budget.cancellation)
                    .find_clusters()?
                    .into_iter()
                    .map(|members| Cluster {
                        size: members.len(),
                        people: members.into_iter().map(PersonSummary::from).collect(),
                    })
                    .collect();

                Ok(ClusterReport {
                    count: clusters.len(),
                    clusters,
                })
            })
            .await
    }

    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn statistics(&self) -> Result<GraphStatistics> {
        self.context
            .run_bounded("statistics", |graph, budget| graph.statistics(&budget.cancellation))
            .await
    }
}
