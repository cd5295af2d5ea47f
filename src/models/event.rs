use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::DriverRecord;
use crate::models::shipment::ShipmentRecord;

/// Change notification emitted by the store's write path. `version` is the
/// document version the triggering write produced; compensating writes fence
/// on it.
#[derive(Debug, Clone)]
pub struct DocumentChange<T> {
    pub id: String,
    pub previous: Option<T>,
    pub current: T,
    pub version: u64,
}

#[derive(Debug, Clone)]
pub enum StoreEvent {
    DriverLocationChanged(DocumentChange<DriverRecord>),
    ShipmentStatusChanged(DocumentChange<ShipmentRecord>),
}

/// Warning event emitted when a location update is vetoed as physically
/// implausible. Pushed to websocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedAlert {
    pub id: Uuid,
    pub driver_id: String,
    pub speed_kmh: f64,
    pub distance_meters: f64,
    pub detected_at: DateTime<Utc>,
}
