//! Axum routes for the demonstration service: rebuild the topology from a
//! posted resource set, then query it.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::state::{build_topology, RebuildRequest, ServiceState};
use crate::types::Locator;
use crate::POLICY_GRAPH_SCHEMA_VERSION;

pub fn create_router(state: ServiceState) -> Router {
    Router::new()
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .route("/api/topology/rebuild", post(rebuild))
        .route("/api/topology/paths", get(paths))
        .route("/api/topology/dot", get(dot))
        .with_state(state)
}

async fn health_live() -> impl IntoResponse {
    StatusCode::OK
}

async fn health_ready(State(state): State<ServiceState>) -> impl IntoResponse {
    if state.current().is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[derive(Debug, Serialize)]
struct RebuildResponse {
    node_count: usize,
    warning_count: usize,
    schema_version: &'static str,
}

async fn rebuild(State(state): State<ServiceState>, Json(request): Json<RebuildRequest>) -> impl IntoResponse {
    match build_topology(request, &state.config) {
        Ok((topology, warnings)) => {
            let node_count = topology.roots_targetables().len();
            state.replace(topology);
            (
                StatusCode::OK,
                Json(RebuildResponse {
                    node_count,
                    warning_count: warnings.len(),
                    schema_version: POLICY_GRAPH_SCHEMA_VERSION,
                }),
            )
                .into_response()
        }
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, Json(serde_json::json!({"error": e.to_string()}))).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct PathsQuery {
    from: String,
    to: String,
}

async fn paths(State(state): State<ServiceState>, Query(q): Query<PathsQuery>) -> impl IntoResponse {
    let Some(topology) = state.current() else {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({"error": "no topology built yet"}))).into_response();
    };
    let from_locator = raw_locator(&q.from);
    let to_locator = raw_locator(&q.to);
    let found = topology.paths(&from_locator, &to_locator);
    let rendered: Vec<Vec<String>> = found.into_iter().map(|path| path.into_iter().map(String::from).collect()).collect();
    (StatusCode::OK, Json(serde_json::json!({"paths": rendered}))).into_response()
}

async fn dot(State(state): State<ServiceState>) -> impl IntoResponse {
    match state.current() {
        Some(topology) => (StatusCode::OK, topology.to_dot()).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "no topology built yet").into_response(),
    }
}

/// Locators passed over the wire are already rendered strings (the grammar
/// is total and stable, §2); this wraps one back into a `Locator` without
/// re-deriving it from constituent parts.
fn raw_locator(s: &str) -> Locator {
    serde_json::from_value(serde_json::Value::String(s.to_string())).expect("locator is a plain string")
}
