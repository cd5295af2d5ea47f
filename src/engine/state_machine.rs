//! Shipment status state machine: `pending → accepted → in_transit →
//! completed`, with `cancelled` reachable from any non-terminal state. Only
//! observed transitions (previous ≠ new) produce effects. Planning is pure;
//! execution is async and best-effort per effect — the two effects are not
//! transactionally linked, and neither can fail the triggering transition.

use std::time::Instant;

use chrono::{Duration, Utc};
use tracing::info;

use crate::engine::stats;
use crate::models::shipment::{ShipmentRecord, ShipmentStatus};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch a route from the driver's current location to the shipment
    /// destination and merge the result plus an ETA into the shipment.
    FetchEta {
        shipment_id: String,
        driver_id: String,
    },
    /// Count the completed trip on the driver record and clear its active
    /// shipment.
    RecordCompletion {
        shipment_id: String,
        driver_id: String,
    },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::FetchEta { .. } => "fetch_eta",
            Effect::RecordCompletion { .. } => "record_completion",
        }
    }
}

/// Outcome of one executed effect. Swallowed failures are a policy, not an
/// accident: they surface here as a value the dispatcher logs and counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectOutcome {
    Applied,
    Skipped(&'static str),
    Failed(String),
}

impl EffectOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            EffectOutcome::Applied => "applied",
            EffectOutcome::Skipped(_) => "skipped",
            EffectOutcome::Failed(_) => "failed",
        }
    }
}

pub fn plan_effects(previous: ShipmentStatus, current: &ShipmentRecord) -> Vec<Effect> {
    // Same-status writes are no-ops.
    if previous == current.status {
        return Vec::new();
    }

    let mut effects = Vec::new();

    if previous == ShipmentStatus::Pending && current.status == ShipmentStatus::Accepted {
        if let Some(driver_id) = &current.driver_id {
            effects.push(Effect::FetchEta {
                shipment_id: current.id.clone(),
                driver_id: driver_id.clone(),
            });
        }
    }

    if current.status == ShipmentStatus::Completed {
        if let Some(driver_id) = &current.driver_id {
            effects.push(Effect::RecordCompletion {
                shipment_id: current.id.clone(),
                driver_id: driver_id.clone(),
            });
        }
    }

    effects
}

pub async fn execute_effect(state: &AppState, effect: &Effect) -> EffectOutcome {
    match effect {
        Effect::FetchEta {
            shipment_id,
            driver_id,
        } => fetch_eta(state, shipment_id, driver_id).await,
        Effect::RecordCompletion {
            shipment_id,
            driver_id,
        } => record_completion(state, shipment_id, driver_id),
    }
}

/// Reads snapshots, calls the oracle with no record guard held, then merges
/// the result in a single write. A concurrent status flip during the oracle
/// call loses the derived fields gracefully (last write wins).
async fn fetch_eta(state: &AppState, shipment_id: &str, driver_id: &str) -> EffectOutcome {
    let Some(shipment) = state.store.get_shipment(shipment_id) else {
        return EffectOutcome::Failed(format!("shipment {shipment_id} not found"));
    };
    let Some(driver) = state.store.get_driver(driver_id) else {
        return EffectOutcome::Failed(format!("driver {driver_id} not found"));
    };
    let Some(location) = driver.doc.current_location else {
        return EffectOutcome::Skipped("driver location unknown");
    };

    let start = Instant::now();
    let result = state
        .oracle
        .route(location.point, shipment.doc.destination)
        .await;
    let elapsed = start.elapsed().as_secs_f64();

    match result {
        Ok(route) => {
            state.metrics.observe_oracle("route", "success", elapsed);
            let eta = Utc::now() + Duration::seconds(i64::from(route.duration_seconds));

            if let Err(err) = state.store.merge_route_fields(shipment_id, &route, eta) {
                return EffectOutcome::Failed(err.to_string());
            }

            info!(
                shipment_id = %shipment_id,
                distance_meters = route.distance_meters,
                duration_seconds = route.duration_seconds,
                "route merged into shipment"
            );
            EffectOutcome::Applied
        }
        Err(err) => {
            state.metrics.observe_oracle("route", "error", elapsed);
            EffectOutcome::Failed(err.to_string())
        }
    }
}

fn record_completion(state: &AppState, shipment_id: &str, driver_id: &str) -> EffectOutcome {
    if !state.store.record_completion(shipment_id) {
        return EffectOutcome::Skipped("completion already recorded");
    }

    match stats::increment(&state.store, driver_id) {
        Ok(_) => EffectOutcome::Applied,
        Err(err) => EffectOutcome::Failed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{plan_effects, Effect};
    use crate::models::location::GeoPoint;
    use crate::models::shipment::{ShipmentRecord, ShipmentStatus};

    fn shipment(status: ShipmentStatus, driver_id: Option<&str>) -> ShipmentRecord {
        ShipmentRecord {
            id: "s1".to_string(),
            status,
            driver_id: driver_id.map(str::to_string),
            destination: GeoPoint {
                lat: 40.7,
                lng: -74.0,
            },
            polyline: None,
            distance_meters: None,
            duration_seconds: None,
            eta_timestamp: None,
        }
    }

    #[test]
    fn same_status_write_plans_nothing() {
        let current = shipment(ShipmentStatus::Accepted, Some("d1"));
        assert!(plan_effects(ShipmentStatus::Accepted, &current).is_empty());
    }

    #[test]
    fn pending_to_accepted_with_driver_plans_eta_fetch() {
        let current = shipment(ShipmentStatus::Accepted, Some("d1"));
        let effects = plan_effects(ShipmentStatus::Pending, &current);

        assert_eq!(
            effects,
            vec![Effect::FetchEta {
                shipment_id: "s1".to_string(),
                driver_id: "d1".to_string(),
            }]
        );
    }

    #[test]
    fn pending_to_accepted_without_driver_plans_nothing() {
        let current = shipment(ShipmentStatus::Accepted, None);
        assert!(plan_effects(ShipmentStatus::Pending, &current).is_empty());
    }

    #[test]
    fn accepted_to_in_transit_plans_nothing() {
        let current = shipment(ShipmentStatus::InTransit, Some("d1"));
        assert!(plan_effects(ShipmentStatus::Accepted, &current).is_empty());
    }

    #[test]
    fn any_transition_to_completed_plans_stats_update() {
        for previous in [
            ShipmentStatus::Pending,
            ShipmentStatus::Accepted,
            ShipmentStatus::InTransit,
        ] {
            let current = shipment(ShipmentStatus::Completed, Some("d1"));
            let effects = plan_effects(previous, &current);

            assert_eq!(
                effects,
                vec![Effect::RecordCompletion {
                    shipment_id: "s1".to_string(),
                    driver_id: "d1".to_string(),
                }]
            );
        }
    }

    #[test]
    fn completion_without_driver_plans_nothing() {
        let current = shipment(ShipmentStatus::Completed, None);
        assert!(plan_effects(ShipmentStatus::InTransit, &current).is_empty());
    }

    #[test]
    fn cancellation_plans_nothing() {
        let current = shipment(ShipmentStatus::Cancelled, Some("d1"));
        assert!(plan_effects(ShipmentStatus::InTransit, &current).is_empty());
    }
}
