pub mod error;
pub mod routes;

pub use error::ApiError;

use crate::config::Config;
use crate::service::{KinshipContext, QualityService, VisualizationService};
use crate::store::EntityStore;
use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handler state; services are cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub visualization: VisualizationService,
    pub quality: QualityService,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, config: Arc<Config>, metrics: Option<PrometheusHandle>) -> Self {
        let context = KinshipContext::new(store, config);
        Self {
            visualization: VisualizationService::new(context.clone()),
            quality: QualityService::new(context),
            metrics,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/visualizations/calculate-relationship",
            post(routes::calculate_relationship),
        )
        .route("/visualizations/fan-chart/:handle", get(routes::fan_chart))
        .route("/visualizations/tree-chart/:handle", get(routes::tree_chart))
        .route("/visualizations/descendant-tree/:handle", get(routes::descendant_tree))
        .route("/quality/disconnected", get(routes::disconnected))
        .route("/quality/clusters", get(routes::clusters))
        .route("/quality/statistics", get(routes::statistics))
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until the process is stopped
pub async fn serve(config: Arc<Config>, store: Arc<dyn EntityStore>, metrics: Option<PrometheusHandle>) -> Result<()> {
    let address = config.server.bind_address.clone();
    let app = router(AppState::new(store, config, metrics));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("Kinship engine listening on {}", address);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
