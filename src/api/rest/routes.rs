//! Callable route endpoints. Unlike the best-effort ETA effect, a caller is
//! synchronously waiting here, so every oracle error kind is surfaced
//! verbatim as a structured error code.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::location::GeoPoint;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/routes/compute", post(compute_route))
        .route("/routes/optimize", post(optimize_route))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRouteRequest {
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub dest_lat: Option<f64>,
    pub dest_lng: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRouteResponse {
    pub polyline: String,
    pub distance_meters: u32,
    pub duration_seconds: u32,
}

#[derive(Deserialize)]
pub struct OptimizeRouteRequest {
    pub waypoints: Vec<GeoPoint>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRouteResponse {
    pub polyline: String,
    pub distance_meters: u32,
    pub duration_seconds: u32,
    pub waypoint_order: Vec<usize>,
}

fn require_bearer(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let expected = state
        .api_token
        .as_deref()
        .ok_or_else(|| AppError::Unauthenticated("caller authentication not configured".to_string()))?;

    let supplied = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthenticated("missing bearer token".to_string()))?;

    if supplied != expected {
        return Err(AppError::Unauthenticated("invalid bearer token".to_string()));
    }

    Ok(())
}

fn coordinate(value: Option<f64>, name: &str) -> Result<f64, AppError> {
    value.ok_or_else(|| AppError::InvalidArgument(format!("{name} is required")))
}

async fn compute_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ComputeRouteRequest>,
) -> Result<Json<ComputeRouteResponse>, AppError> {
    require_bearer(&state, &headers)?;

    let origin = GeoPoint {
        lat: coordinate(payload.origin_lat, "originLat")?,
        lng: coordinate(payload.origin_lng, "originLng")?,
    };
    let destination = GeoPoint {
        lat: coordinate(payload.dest_lat, "destLat")?,
        lng: coordinate(payload.dest_lng, "destLng")?,
    };

    let start = Instant::now();
    let result = state.oracle.route(origin, destination).await;
    let elapsed = start.elapsed().as_secs_f64();

    let outcome = if result.is_ok() { "success" } else { "error" };
    state.metrics.observe_oracle("route", outcome, elapsed);

    let route = result?;
    Ok(Json(ComputeRouteResponse {
        polyline: route.polyline,
        distance_meters: route.distance_meters,
        duration_seconds: route.duration_seconds,
    }))
}

async fn optimize_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<OptimizeRouteRequest>,
) -> Result<Json<OptimizeRouteResponse>, AppError> {
    require_bearer(&state, &headers)?;

    let start = Instant::now();
    let result = state.oracle.optimize(&payload.waypoints).await;
    let elapsed = start.elapsed().as_secs_f64();

    let outcome = if result.is_ok() { "success" } else { "error" };
    state.metrics.observe_oracle("optimize", outcome, elapsed);

    let optimized = result?;
    Ok(Json(OptimizeRouteResponse {
        polyline: optimized.route.polyline,
        distance_meters: optimized.route.distance_meters,
        duration_seconds: optimized.route.duration_seconds,
        waypoint_order: optimized.waypoint_order,
    }))
}
