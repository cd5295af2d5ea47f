use tracing::info;

use crate::error::AppError;
use crate::models::driver::DriverRecord;
use crate::store::DocumentStore;

/// Counts a completed trip on the driver record: `total_trips += 1` and
/// `current_shipment_id = None` as one atomic mutation. Idempotence is the
/// caller's concern; the dispatcher fences duplicate completion deliveries
/// with the store's completion ledger before calling this.
pub fn increment(store: &DocumentStore, driver_id: &str) -> Result<DriverRecord, AppError> {
    let driver = store.increment_driver_trips(driver_id)?;

    info!(
        driver_id = %driver_id,
        total_trips = driver.total_trips,
        "driver trip stats updated"
    );

    Ok(driver)
}
