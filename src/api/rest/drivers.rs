use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::driver::DriverRecord;
use crate::models::location::LocationSample;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers/:id", put(put_driver).get(get_driver))
        .route("/drivers/:id/location", patch(update_location))
}

#[derive(Deserialize)]
pub struct PutDriverRequest {
    #[serde(default)]
    pub current_location: Option<LocationSample>,
    #[serde(default)]
    pub total_trips: u64,
    #[serde(default)]
    pub current_shipment_id: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: LocationSample,
}

/// Seeds a driver document. Stands in for the upstream provisioning flow;
/// bypasses the event chain on purpose.
async fn put_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<PutDriverRequest>,
) -> Result<Json<DriverRecord>, AppError> {
    if let Some(location) = &payload.current_location {
        if !location.point.in_bounds() {
            return Err(AppError::InvalidArgument(
                "current_location out of range".to_string(),
            ));
        }
    }

    let driver = DriverRecord {
        id,
        last_updated: payload.current_location.as_ref().map(|_| chrono::Utc::now()),
        current_location: payload.current_location,
        total_trips: payload.total_trips,
        current_shipment_id: payload.current_shipment_id,
    };

    state.store.put_driver(driver.clone());
    Ok(Json(driver))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DriverRecord>, AppError> {
    let driver = state
        .store
        .get_driver(&id)
        .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;

    Ok(Json(driver.doc))
}

/// The driver-ping write path. The write is accepted here; the plausibility
/// check runs on the resulting change notification, and a veto shows up only
/// as a compensating write on the record.
async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<DriverRecord>, AppError> {
    if !payload.location.point.in_bounds() {
        return Err(AppError::InvalidArgument("location out of range".to_string()));
    }

    let driver = state
        .store
        .update_driver_location(&id, payload.location)
        .await?;

    Ok(Json(driver))
}
