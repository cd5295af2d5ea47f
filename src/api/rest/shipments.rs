use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::location::GeoPoint;
use crate::models::shipment::{ShipmentRecord, ShipmentStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shipments/:id", put(put_shipment).get(get_shipment))
        .route("/shipments/:id/status", patch(update_status))
}

#[derive(Deserialize)]
pub struct PutShipmentRequest {
    #[serde(default = "default_status")]
    pub status: ShipmentStatus,
    #[serde(default)]
    pub driver_id: Option<String>,
    pub destination: GeoPoint,
}

fn default_status() -> ShipmentStatus {
    ShipmentStatus::Pending
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ShipmentStatus,
}

/// Seeds a shipment document. Stands in for the upstream order flow;
/// bypasses the event chain on purpose.
async fn put_shipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<PutShipmentRequest>,
) -> Result<Json<ShipmentRecord>, AppError> {
    if !payload.destination.in_bounds() {
        return Err(AppError::InvalidArgument(
            "destination out of range".to_string(),
        ));
    }

    let shipment = ShipmentRecord {
        id,
        status: payload.status,
        driver_id: payload.driver_id,
        destination: payload.destination,
        polyline: None,
        distance_meters: None,
        duration_seconds: None,
        eta_timestamp: None,
    };

    state.store.put_shipment(shipment.clone());
    Ok(Json(shipment))
}

async fn get_shipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ShipmentRecord>, AppError> {
    let shipment = state
        .store
        .get_shipment(&id)
        .ok_or_else(|| AppError::NotFound(format!("shipment {id} not found")))?;

    Ok(Json(shipment.doc))
}

/// Status write path. The status change itself is applied here; transition
/// side effects run on the change notification this write fires.
async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<ShipmentRecord>, AppError> {
    let shipment = state.store.update_shipment_status(&id, payload.status).await?;
    Ok(Json(shipment))
}
