//! Centroid-based outlier filtering.
//!
//! A stop is an outlier when its great-circle distance from the mean position
//! of all stops exceeds the threshold. The filter is advisory: stops whose
//! coordinates cannot be measured are kept, never dropped.

use tracing::{debug, info, warn};

use crate::haversine::distance;
use crate::model::LocatedStop;

/// Arithmetic mean (lat, lng) over stops with finite coordinates.
pub fn centroid(stops: &[LocatedStop]) -> Option<(f64, f64)> {
    let (count, lat_sum, lng_sum) = stops
        .iter()
        .filter(|stop| stop.has_valid_coordinates())
        .fold((0usize, 0.0, 0.0), |(count, lat, lng), stop| {
            (count + 1, lat + stop.latitude, lng + stop.longitude)
        });

    if count == 0 {
        return None;
    }
    Some((lat_sum / count as f64, lng_sum / count as f64))
}

/// Drop stops farther than `threshold_km` from the centroid.
///
/// Returns the input unchanged when there are fewer than two stops, the
/// threshold is not positive, or no stop has valid coordinates. Relative order
/// of the kept stops is preserved.
pub fn filter_outliers(stops: Vec<LocatedStop>, threshold_km: f64) -> Vec<LocatedStop> {
    if stops.len() < 2 || threshold_km.is_nan() || threshold_km <= 0.0 {
        debug!(
            count = stops.len(),
            threshold_km, "skipping outlier filtering (not applicable)"
        );
        return stops;
    }

    let Some((center_lat, center_lng)) = centroid(&stops) else {
        warn!("cannot compute centroid for outlier filtering: no valid coordinates");
        return stops;
    };

    let threshold_m = threshold_km * 1000.0;
    let input_count = stops.len();

    let kept: Vec<LocatedStop> = stops
        .into_iter()
        .filter(|stop| {
            // Invalid coordinates are kept on purpose: the filter is not a validator.
            if !stop.has_valid_coordinates() {
                warn!(location_id = %stop.id, "keeping location with invalid coordinates");
                return true;
            }
            match distance(stop.latitude, stop.longitude, center_lat, center_lng) {
                Ok(meters) if meters <= threshold_m => true,
                Ok(meters) => {
                    debug!(
                        location_id = %stop.id,
                        original_index = stop.original_index,
                        distance_m = meters.round(),
                        threshold_m = threshold_m.round(),
                        "filtering outlier location"
                    );
                    false
                }
                Err(err) => {
                    warn!(location_id = %stop.id, error = %err, "could not measure location, keeping it");
                    true
                }
            }
        })
        .collect();

    info!(
        input_count,
        kept_count = kept.len(),
        excluded_count = input_count - kept.len(),
        threshold_km,
        "outlier filtering complete"
    );
    kept
}
