//! Routes store change notifications to the validator and the shipment
//! state machine. This is the only place side effects are carried out:
//! compensating writes, alert broadcast, effect execution, and the logging
//! of every effect outcome.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::state_machine::{execute_effect, plan_effects, EffectOutcome};
use crate::engine::validator::{validate_location_update, Decision};
use crate::models::driver::DriverRecord;
use crate::models::event::{DocumentChange, SpeedAlert, StoreEvent};
use crate::models::shipment::ShipmentRecord;
use crate::state::AppState;

pub async fn run_event_dispatcher(state: Arc<AppState>, mut rx: mpsc::Receiver<StoreEvent>) {
    info!("event dispatcher started");

    while let Some(event) = rx.recv().await {
        dispatch(&state, event).await;
    }

    warn!("event dispatcher stopped: change channel closed");
}

pub async fn dispatch(state: &AppState, event: StoreEvent) {
    match event {
        StoreEvent::DriverLocationChanged(change) => handle_location_change(state, change).await,
        StoreEvent::ShipmentStatusChanged(change) => handle_status_change(state, change).await,
    }
}

async fn handle_location_change(state: &AppState, change: DocumentChange<DriverRecord>) {
    let Some(previous) = &change.previous else {
        return;
    };
    let Some(next) = &change.current.current_location else {
        return;
    };

    let decision = validate_location_update(
        previous.current_location.as_ref(),
        previous.last_updated,
        next,
        change.current.last_updated,
        state.max_speed_kmh,
    );

    match decision {
        Decision::Accept => {
            state
                .metrics
                .location_updates_total
                .with_label_values(&["accepted"])
                .inc();
        }
        Decision::Revert {
            speed_kmh,
            distance_meters,
        } => {
            warn!(
                driver_id = %change.id,
                speed_kmh,
                distance_meters,
                "implausible location update; reverting"
            );

            state
                .metrics
                .location_updates_total
                .with_label_values(&["reverted"])
                .inc();

            let alert = SpeedAlert {
                id: Uuid::new_v4(),
                driver_id: change.id.clone(),
                speed_kmh,
                distance_meters,
                detected_at: Utc::now(),
            };
            let _ = state.alerts_tx.send(alert);

            // Fenced on the version the offending write produced; a newer
            // write wins and the revert is dropped.
            state.store.revert_driver_location(
                &change.id,
                change.version,
                previous.current_location.clone(),
                previous.last_updated,
            );
        }
    }
}

async fn handle_status_change(state: &AppState, change: DocumentChange<ShipmentRecord>) {
    let Some(previous) = &change.previous else {
        return;
    };

    if previous.status != change.current.status {
        info!(
            shipment_id = %change.id,
            previous = ?previous.status,
            current = ?change.current.status,
            "shipment status changed"
        );
    }

    for effect in plan_effects(previous.status, &change.current) {
        let outcome = execute_effect(state, &effect).await;

        state
            .metrics
            .effects_total
            .with_label_values(&[effect.name(), outcome.label()])
            .inc();

        match &outcome {
            EffectOutcome::Applied => {
                info!(shipment_id = %change.id, effect = effect.name(), "effect applied");
            }
            EffectOutcome::Skipped(reason) => {
                info!(shipment_id = %change.id, effect = effect.name(), reason = %reason, "effect skipped");
            }
            EffectOutcome::Failed(reason) => {
                // Best-effort by design: the status transition stands.
                warn!(
                    shipment_id = %change.id,
                    effect = effect.name(),
                    reason = %reason,
                    "effect failed; transition unaffected"
                );
            }
        }
    }
}
