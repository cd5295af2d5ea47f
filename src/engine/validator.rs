//! Anti-spoofing check for driver location updates. The decision function is
//! pure; the compensating write, warning log, and alert broadcast belong to
//! the dispatcher.

use chrono::{DateTime, Utc};

use crate::geo::haversine_meters;
use crate::models::location::LocationSample;

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Accept,
    /// Veto: the move implies a physically implausible speed. The caller
    /// must restore the previous location and previous write timestamp.
    Revert {
        speed_kmh: f64,
        distance_meters: f64,
    },
}

/// Decides whether a location update is physically plausible given the
/// previously stored sample and the store's trusted write timestamps.
///
/// Missing timestamps default to "now", which collapses the elapsed time to
/// zero or less and accepts the update. The speed check loses accuracy in
/// that case but never rejects for a missing timestamp alone.
pub fn validate_location_update(
    previous: Option<&LocationSample>,
    previous_written: Option<DateTime<Utc>>,
    next: &LocationSample,
    next_written: Option<DateTime<Utc>>,
    max_speed_kmh: f64,
) -> Decision {
    let Some(previous) = previous else {
        // First-ever update, nothing to compare against.
        return Decision::Accept;
    };

    if previous.point == next.point {
        return Decision::Accept;
    }

    let now = Utc::now();
    let previous_ts = previous_written.unwrap_or(now);
    let next_ts = next_written.unwrap_or(now);
    let elapsed_seconds = (next_ts - previous_ts).num_milliseconds() as f64 / 1000.0;

    // Out-of-order or simultaneous writes carry no usable rate signal.
    if elapsed_seconds <= 0.0 {
        return Decision::Accept;
    }

    let distance_meters = haversine_meters(&previous.point, &next.point);
    let speed_kmh = (distance_meters / 1000.0) / (elapsed_seconds / 3600.0);

    if speed_kmh > max_speed_kmh {
        Decision::Revert {
            speed_kmh,
            distance_meters,
        }
    } else {
        Decision::Accept
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{validate_location_update, Decision};
    use crate::models::location::LocationSample;

    const MAX_SPEED: f64 = 200.0;

    #[test]
    fn first_update_is_always_accepted() {
        let next = LocationSample::at(40.0, -73.0);
        let decision = validate_location_update(None, None, &next, Some(Utc::now()), MAX_SPEED);
        assert_eq!(decision, Decision::Accept);
    }

    #[test]
    fn identical_coordinates_accept_regardless_of_elapsed_time() {
        let sample = LocationSample::at(40.0, -73.0);
        let t0 = Utc::now();

        let decision = validate_location_update(
            Some(&sample),
            Some(t0),
            &sample.clone(),
            Some(t0 + Duration::milliseconds(1)),
            MAX_SPEED,
        );
        assert_eq!(decision, Decision::Accept);
    }

    #[test]
    fn non_positive_elapsed_time_accepts_without_a_speed_check() {
        let previous = LocationSample::at(40.0, -73.0);
        let next = LocationSample::at(40.9, -73.0);
        let t0 = Utc::now();

        // Out of order: next written before previous.
        let decision = validate_location_update(
            Some(&previous),
            Some(t0),
            &next,
            Some(t0 - Duration::seconds(5)),
            MAX_SPEED,
        );
        assert_eq!(decision, Decision::Accept);

        // Simultaneous.
        let decision =
            validate_location_update(Some(&previous), Some(t0), &next, Some(t0), MAX_SPEED);
        assert_eq!(decision, Decision::Accept);
    }

    #[test]
    fn hundred_km_jump_in_a_minute_is_reverted() {
        let previous = LocationSample::at(40.0, -73.0);
        let next = LocationSample::at(40.9, -73.0);
        let t0 = Utc::now();

        let decision = validate_location_update(
            Some(&previous),
            Some(t0),
            &next,
            Some(t0 + Duration::seconds(60)),
            MAX_SPEED,
        );

        match decision {
            Decision::Revert {
                speed_kmh,
                distance_meters,
            } => {
                assert!((distance_meters - 100_100.0).abs() < 500.0);
                assert!((speed_kmh - 6_006.0).abs() < 50.0);
            }
            Decision::Accept => panic!("expected revert"),
        }
    }

    #[test]
    fn plausible_highway_speed_is_accepted() {
        let previous = LocationSample::at(40.0, -73.0);
        let next = LocationSample::at(40.01, -73.0);
        let t0 = Utc::now();

        // ~1.11 km in 60 s is ~66.6 km/h.
        let decision = validate_location_update(
            Some(&previous),
            Some(t0),
            &next,
            Some(t0 + Duration::seconds(60)),
            MAX_SPEED,
        );
        assert_eq!(decision, Decision::Accept);
    }

    #[test]
    fn missing_timestamps_never_cause_a_rejection() {
        let previous = LocationSample::at(40.0, -73.0);
        let next = LocationSample::at(40.9, -73.0);

        let decision = validate_location_update(Some(&previous), None, &next, None, MAX_SPEED);
        assert_eq!(decision, Decision::Accept);
    }

    #[test]
    fn threshold_is_configurable() {
        let previous = LocationSample::at(40.0, -73.0);
        let next = LocationSample::at(40.01, -73.0);
        let t0 = Utc::now();

        // 66.6 km/h trips a 50 km/h threshold.
        let decision = validate_location_update(
            Some(&previous),
            Some(t0),
            &next,
            Some(t0 + Duration::seconds(60)),
            50.0,
        );
        assert!(matches!(decision, Decision::Revert { .. }));
    }
}
