use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::location::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    Accepted,
    InTransit,
    Completed,
    Cancelled,
}

impl ShipmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Completed | ShipmentStatus::Cancelled)
    }
}

/// A shipment document. Status is set externally (client/dispatcher); the
/// route fields (`polyline`, `distance_meters`, `duration_seconds`,
/// `eta_timestamp`) are owned by the state machine's side-effect path and
/// written only there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub id: String,
    pub status: ShipmentStatus,
    #[serde(default)]
    pub driver_id: Option<String>,
    pub destination: GeoPoint,
    #[serde(default)]
    pub polyline: Option<String>,
    #[serde(default)]
    pub distance_meters: Option<u32>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub eta_timestamp: Option<DateTime<Utc>>,
}

/// Immutable value returned by the routing oracle. Never persisted on its
/// own, only merged into a shipment's route fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteResult {
    pub polyline: String,
    pub distance_meters: u32,
    pub duration_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    pub route: RouteResult,
    /// Original indices of the supplied waypoints in optimized visit order.
    pub waypoint_order: Vec<usize>,
}
