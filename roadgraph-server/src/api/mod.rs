//! HTTP routes of the query service.

mod error;

use std::sync::Arc;

use axum::{
    Json, Router,
    error_handling::HandleErrorLayer,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use roadgraph_core::{
    loading::{PlaceSummary, SpatialStore},
    routing::{RouteAssembler, RouteResponse},
};
use serde_json::{Value, json};
use tower::{BoxError, ServiceBuilder, limit::GlobalConcurrencyLimitLayer, timeout::TimeoutLayer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use error::ApiError;

use crate::{config::HttpConfig, state::AppState};

pub fn router(state: Arc<AppState>, http: &HttpConfig) -> Router {
    Router::new()
        .route("/places/{name}", get(search_places))
        .route("/calc_route/from/{from}/to/{to}", get(calc_route))
        .route("/health", get(health))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(http.request_timeout()))
                .layer(GlobalConcurrencyLimitLayer::new(
                    http.max_concurrent_requests.max(1),
                )),
        )
        .layer(CorsLayer::permissive())
}

async fn search_places(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<PlaceSummary>>, ApiError> {
    Ok(Json(state.store.search_places(&name)?))
}

async fn calc_route(
    State(state): State<Arc<AppState>>,
    Path((from, to)): Path<(String, String)>,
) -> Result<Json<RouteResponse>, ApiError> {
    let response = tokio::task::spawn_blocking(move || {
        let route = state.graph.shortest_route(&from, &to)?;
        let assembled =
            RouteAssembler::with_tolerance(&state.store, state.on_line_tolerance).assemble(route);
        let response = RouteResponse::new(Uuid::new_v4().to_string(), &assembled);
        info!(
            route_id = %response.route_id,
            %from,
            %to,
            legs = response.steps.len(),
            meters = assembled.distance(),
            "route resolved"
        );
        Ok::<_, ApiError>(response)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("route task failed: {e}")))??;

    Ok(Json(response))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.graph.stats();
    Json(json!({
        "status": "ok",
        "nodes": stats.nodes,
        "places": stats.places,
        "edges": stats.edges,
        "missing_geometry": stats.missing_geometry,
    }))
}

async fn handle_middleware_error(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("unhandled internal error: {err}"),
        )
    }
}
