use crate::http::error::ApiError;
use crate::http::AppState;
use crate::kinship::GraphStatistics;
use crate::types::{ClusterReport, DisconnectedReport, RelationshipResult, TreeChart, TreeNode};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRequest {
    pub person1_handle: String,
    pub person2_handle: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub generations: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DisconnectedQuery {
    pub root: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

pub async fn calculate_relationship(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RelationshipRequest>, JsonRejection>,
) -> ApiResult<RelationshipResult> {
    let Json(request) = payload?;
    let result = state
        .visualization
        .calculate_relationship(&request.person1_handle, &request.person2_handle)
        .await?;
    Ok(Json(result))
}

pub async fn fan_chart(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<TreeNode> {
    Ok(Json(state.visualization.fan_chart(&handle, query.generations).await?))
}

pub async fn tree_chart(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<TreeChart> {
    Ok(Json(state.visualization.tree_chart(&handle, query.generations).await?))
}

pub async fn descendant_tree(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<TreeNode> {
    Ok(Json(
        state
            .visualization
            .descendant_tree(&handle, query.generations)
            .await?,
    ))
}

pub async fn disconnected(
    State(state): State<AppState>,
    Query(query): Query<DisconnectedQuery>,
) -> ApiResult<DisconnectedReport> {
    Ok(Json(state.quality.disconnected(query.root).await?))
}

pub async fn clusters(State(state): State<AppState>) -> ApiResult<ClusterReport> {
    Ok(Json(state.quality.clusters().await?))
}

pub async fn statistics(State(state): State<AppState>) -> ApiResult<GraphStatistics> {
    Ok(Json(state.quality.statistics().await?))
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
