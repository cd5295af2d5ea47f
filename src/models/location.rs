use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn in_bounds(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// One GPS fix as reported by a driver device. `captured_at` is the
/// client-side capture time and is informational only; plausibility checks
/// run against the store's write timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub point: GeoPoint,
    pub captured_at: Option<DateTime<Utc>>,
    pub accuracy_meters: Option<f64>,
}

impl LocationSample {
    pub fn at(lat: f64, lng: f64) -> Self {
        Self {
            point: GeoPoint { lat, lng },
            captured_at: None,
            accuracy_meters: None,
        }
    }
}
