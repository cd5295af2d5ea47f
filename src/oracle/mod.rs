//! Adapter to the external directions/optimization service. One outbound
//! request per call, bounded timeout, no internal retry; callers decide
//! whether a `Transient` failure is worth retrying.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::location::GeoPoint;
use crate::models::shipment::{OptimizedRoute, RouteResult};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("oracle token not configured")]
    MissingCredential,

    #[error("no viable route")]
    NotFound,

    #[error("oracle request failed: {0}")]
    Transient(String),
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OracleError::Transient("oracle request timed out".to_string())
        } else {
            OracleError::Transient(err.to_string())
        }
    }
}

#[async_trait]
pub trait RouteOracle: Send + Sync {
    /// Driving route from `origin` to `destination`.
    async fn route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteResult, OracleError>;

    /// Reorders `waypoints` for minimal total distance. The first and last
    /// waypoints stay fixed as endpoints.
    async fn optimize(&self, waypoints: &[GeoPoint]) -> Result<OptimizedRoute, OracleError>;
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    geometry: String,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct TripWaypoint {
    waypoint_index: usize,
}

#[derive(Debug, Deserialize)]
struct OptimizedTripsResponse {
    #[serde(default)]
    trips: Vec<DirectionsLeg>,
    #[serde(default)]
    waypoints: Vec<TripWaypoint>,
}

impl DirectionsLeg {
    fn into_route_result(self) -> RouteResult {
        RouteResult {
            polyline: self.geometry,
            distance_meters: self.distance.round() as u32,
            duration_seconds: self.duration.round() as u32,
        }
    }
}

/// HTTP client for a Mapbox-shaped directions API.
pub struct HttpRouteOracle {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRouteOracle {
    pub fn new(
        base_url: String,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| OracleError::Transient(format!("failed to build http client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn token(&self) -> Result<&str, OracleError> {
        self.token.as_deref().ok_or(OracleError::MissingCredential)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, OracleError> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(OracleError::Transient(format!(
                "oracle returned status {}",
                response.status()
            )));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RouteOracle for HttpRouteOracle {
    async fn route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteResult, OracleError> {
        if !origin.in_bounds() || !destination.in_bounds() {
            return Err(OracleError::InvalidArgument(
                "origin and destination must be valid coordinates".to_string(),
            ));
        }
        let token = self.token()?;

        let url = format!(
            "{}/directions/v5/mapbox/driving/{},{};{},{}?access_token={}&geometries=polyline6&overview=full&steps=false",
            self.base_url, origin.lng, origin.lat, destination.lng, destination.lat, token,
        );

        let body: DirectionsResponse = self.get_json(url).await?;
        let leg = body.routes.into_iter().next().ok_or(OracleError::NotFound)?;
        Ok(leg.into_route_result())
    }

    async fn optimize(&self, waypoints: &[GeoPoint]) -> Result<OptimizedRoute, OracleError> {
        if waypoints.len() < 2 {
            return Err(OracleError::InvalidArgument(
                "at least 2 waypoints required".to_string(),
            ));
        }
        if let Some(bad) = waypoints.iter().find(|w| !w.in_bounds()) {
            return Err(OracleError::InvalidArgument(format!(
                "waypoint out of range: ({}, {})",
                bad.lat, bad.lng
            )));
        }
        let token = self.token()?;

        let coordinates = waypoints
            .iter()
            .map(|w| format!("{},{}", w.lng, w.lat))
            .collect::<Vec<_>>()
            .join(";");

        let url = format!(
            "{}/optimized-trips/v1/mapbox/driving/{}?access_token={}&geometries=polyline6&overview=full&roundtrip=false&source=first&destination=last",
            self.base_url, coordinates, token,
        );

        let body: OptimizedTripsResponse = self.get_json(url).await?;
        let trip = body.trips.into_iter().next().ok_or(OracleError::NotFound)?;
        let waypoint_order = body.waypoints.iter().map(|w| w.waypoint_index).collect();

        Ok(OptimizedRoute {
            route: trip.into_route_result(),
            waypoint_order,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn oracle(token: Option<&str>) -> HttpRouteOracle {
        HttpRouteOracle::new(
            "https://oracle.invalid".to_string(),
            token.map(str::to_string),
            Duration::from_millis(100),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn route_rejects_out_of_range_coordinates_before_any_io() {
        let origin = GeoPoint { lat: 91.0, lng: 0.0 };
        let destination = GeoPoint { lat: 0.0, lng: 0.0 };

        let err = oracle(Some("t")).route(origin, destination).await.unwrap_err();
        assert!(matches!(err, OracleError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn route_without_token_is_a_precondition_failure() {
        let a = GeoPoint { lat: 40.0, lng: -73.0 };
        let b = GeoPoint { lat: 41.0, lng: -72.0 };

        let err = oracle(None).route(a, b).await.unwrap_err();
        assert!(matches!(err, OracleError::MissingCredential));
    }

    #[tokio::test]
    async fn optimize_requires_two_waypoints() {
        let solo = [GeoPoint { lat: 40.0, lng: -73.0 }];

        let err = oracle(Some("t")).optimize(&solo).await.unwrap_err();
        assert!(matches!(err, OracleError::InvalidArgument(_)));
    }

    #[test]
    fn directions_response_selects_first_route_and_rounds() {
        let raw = serde_json::json!({
            "routes": [
                { "geometry": "abc123", "distance": 5000.4, "duration": 599.6 },
                { "geometry": "alt", "distance": 9000.0, "duration": 900.0 }
            ]
        });

        let parsed: DirectionsResponse = serde_json::from_value(raw).unwrap();
        let route = parsed.routes.into_iter().next().unwrap().into_route_result();

        assert_eq!(route.polyline, "abc123");
        assert_eq!(route.distance_meters, 5000);
        assert_eq!(route.duration_seconds, 600);
    }

    #[test]
    fn optimized_trips_response_surfaces_waypoint_order() {
        let raw = serde_json::json!({
            "trips": [{ "geometry": "xyz", "distance": 1200.0, "duration": 300.0 }],
            "waypoints": [
                { "waypoint_index": 0 },
                { "waypoint_index": 2 },
                { "waypoint_index": 1 }
            ]
        });

        let parsed: OptimizedTripsResponse = serde_json::from_value(raw).unwrap();
        let order: Vec<usize> = parsed.waypoints.iter().map(|w| w.waypoint_index).collect();
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[test]
    fn empty_routes_list_maps_to_not_found() {
        let parsed: DirectionsResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(parsed.routes.is_empty());
    }
}
