use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::location::LocationSample;

/// A driver document. Created by upstream provisioning flows; this service
/// mutates only the location field group (validator path) and the trip-stat
/// field group (completion path). `total_trips` never decreases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverRecord {
    pub id: String,
    pub current_location: Option<LocationSample>,
    /// Store write timestamp of the last accepted location update.
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_trips: u64,
    #[serde(default)]
    pub current_shipment_id: Option<String>,
}
