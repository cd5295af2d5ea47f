//! In-memory document store with per-document versions and change
//! notifications. Every mutator writes one field group and bumps the
//! version; location and status writes additionally emit a tagged
//! `StoreEvent` for the dispatcher. Route-field merges and stat increments
//! are silent, so effect execution can never feed back into itself, and
//! dispatcher-originated writes notify without awaiting queue capacity.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use crate::error::AppError;
use crate::models::driver::DriverRecord;
use crate::models::event::{DocumentChange, StoreEvent};
use crate::models::location::LocationSample;
use crate::models::shipment::{RouteResult, ShipmentRecord, ShipmentStatus};

#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub doc: T,
    pub version: u64,
}

pub struct DocumentStore {
    drivers: DashMap<String, Versioned<DriverRecord>>,
    shipments: DashMap<String, Versioned<ShipmentRecord>>,
    /// Shipment ids whose completion has already been counted. The
    /// idempotency fence for `total_trips` under at-least-once delivery.
    completions: DashMap<String, DateTime<Utc>>,
    change_tx: mpsc::Sender<StoreEvent>,
}

impl DocumentStore {
    pub fn new(change_tx: mpsc::Sender<StoreEvent>) -> Self {
        Self {
            drivers: DashMap::new(),
            shipments: DashMap::new(),
            completions: DashMap::new(),
            change_tx,
        }
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    pub fn shipment_count(&self) -> usize {
        self.shipments.len()
    }

    pub fn get_driver(&self, id: &str) -> Option<Versioned<DriverRecord>> {
        self.drivers.get(id).map(|entry| entry.value().clone())
    }

    pub fn get_shipment(&self, id: &str) -> Option<Versioned<ShipmentRecord>> {
        self.shipments.get(id).map(|entry| entry.value().clone())
    }

    /// Seeds a whole driver document. Upstream-flow boundary; emits no event.
    pub fn put_driver(&self, driver: DriverRecord) {
        self.drivers
            .insert(driver.id.clone(), Versioned { doc: driver, version: 1 });
    }

    /// Seeds a whole shipment document. Upstream-flow boundary; emits no event.
    pub fn put_shipment(&self, shipment: ShipmentRecord) {
        self.shipments
            .insert(shipment.id.clone(), Versioned { doc: shipment, version: 1 });
    }

    /// Writes the location field group of a driver, stamping the trusted
    /// write clock, and notifies the dispatcher.
    pub async fn update_driver_location(
        &self,
        id: &str,
        sample: LocationSample,
    ) -> Result<DriverRecord, AppError> {
        let change = {
            let mut entry = self
                .drivers
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;

            let previous = entry.doc.clone();
            entry.doc.current_location = Some(sample);
            entry.doc.last_updated = Some(Utc::now());
            entry.version += 1;

            DocumentChange {
                id: id.to_string(),
                previous: Some(previous),
                current: entry.doc.clone(),
                version: entry.version,
            }
        };

        let current = change.current.clone();
        self.emit(StoreEvent::DriverLocationChanged(change)).await;
        Ok(current)
    }

    /// Compensating write: restores the previous location field group,
    /// fenced on the version the offending write produced. Returns false
    /// when a third writer superseded that version, in which case the
    /// revert is dropped (best-effort, see DESIGN.md).
    ///
    /// Called from the dispatcher, the sole consumer of the change queue,
    /// so the notification must never await queue capacity. It is sent with
    /// `try_send` and dropped on overflow; the revert's own notification is
    /// self-quieting anyway (restored timestamp fails the elapsed check).
    pub fn revert_driver_location(
        &self,
        id: &str,
        fence_version: u64,
        location: Option<LocationSample>,
        last_updated: Option<DateTime<Utc>>,
    ) -> bool {
        let change = {
            let Some(mut entry) = self.drivers.get_mut(id) else {
                return false;
            };

            if entry.version != fence_version {
                warn!(
                    driver_id = %id,
                    fence_version,
                    current_version = entry.version,
                    "revert superseded by a newer write; dropping"
                );
                return false;
            }

            let previous = entry.doc.clone();
            entry.doc.current_location = location;
            // Restoring the old timestamp makes the notification below fail
            // the elapsed-time check and pass through untouched.
            entry.doc.last_updated = last_updated;
            entry.version += 1;

            DocumentChange {
                id: id.to_string(),
                previous: Some(previous),
                current: entry.doc.clone(),
                version: entry.version,
            }
        };

        self.emit_nowait(StoreEvent::DriverLocationChanged(change));
        true
    }

    /// Writes the status field of a shipment and notifies the dispatcher.
    /// Terminal shipments are frozen: only same-status writes pass.
    pub async fn update_shipment_status(
        &self,
        id: &str,
        status: ShipmentStatus,
    ) -> Result<ShipmentRecord, AppError> {
        let change = {
            let mut entry = self
                .shipments
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(format!("shipment {id} not found")))?;

            if entry.doc.status.is_terminal() && status != entry.doc.status {
                return Err(AppError::InvalidArgument(format!(
                    "shipment {id} is {:?} and cannot change status",
                    entry.doc.status
                )));
            }

            let previous = entry.doc.clone();
            entry.doc.status = status;
            entry.version += 1;

            DocumentChange {
                id: id.to_string(),
                previous: Some(previous),
                current: entry.doc.clone(),
                version: entry.version,
            }
        };

        let current = change.current.clone();
        self.emit(StoreEvent::ShipmentStatusChanged(change)).await;
        Ok(current)
    }

    /// Merges oracle output into a shipment's route fields. Last write wins;
    /// a concurrent status flip during the oracle call is lost gracefully.
    pub fn merge_route_fields(
        &self,
        id: &str,
        route: &RouteResult,
        eta: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut entry = self
            .shipments
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("shipment {id} not found")))?;

        entry.doc.polyline = Some(route.polyline.clone());
        entry.doc.distance_meters = Some(route.distance_meters);
        entry.doc.duration_seconds = Some(route.duration_seconds);
        entry.doc.eta_timestamp = Some(eta);
        entry.version += 1;
        Ok(())
    }

    /// Records that a shipment's completion has been counted. Returns false
    /// when this completion was already recorded.
    pub fn record_completion(&self, shipment_id: &str) -> bool {
        self.completions
            .insert(shipment_id.to_string(), Utc::now())
            .is_none()
    }

    /// Applies the trip-stat mutation to a driver as one atomic write:
    /// `total_trips += 1`, `current_shipment_id = None`.
    pub fn increment_driver_trips(&self, id: &str) -> Result<DriverRecord, AppError> {
        let mut entry = self
            .drivers
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;

        entry.doc.total_trips += 1;
        entry.doc.current_shipment_id = None;
        entry.version += 1;
        Ok(entry.doc.clone())
    }

    async fn emit(&self, event: StoreEvent) {
        if self.change_tx.send(event).await.is_err() {
            warn!("change notification dropped: dispatcher channel closed");
        }
    }

    fn emit_nowait(&self, event: StoreEvent) {
        match self.change_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("change notification dropped: queue full");
            }
            Err(TrySendError::Closed(_)) => {
                warn!("change notification dropped: dispatcher channel closed");
            }
        }
    }
}
