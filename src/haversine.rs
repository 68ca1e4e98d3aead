//! Haversine distances and distance matrices.
//!
//! Uses great-circle distance on a spherical Earth. Ignores roads, but needs
//! nothing beyond the coordinates themselves.

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};

/// Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points given in degrees.
///
/// Callers are expected to have range-checked the coordinates; this only
/// rejects values that are not finite numbers.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<f64> {
    for (latitude, longitude) in [(lat1, lon1), (lat2, lon2)] {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(Error::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
    }

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    Ok(EARTH_RADIUS_M * c)
}

/// Estimated travel time in seconds at a constant speed.
///
/// `None` when the speed is not a positive number or the distance is negative.
pub fn duration_seconds(distance_m: f64, speed_kmh: f64) -> Option<f64> {
    if !speed_kmh.is_finite() || speed_kmh <= 0.0 || distance_m.is_nan() || distance_m < 0.0 {
        return None;
    }
    let speed_mps = speed_kmh * 1000.0 / 3600.0;
    Some(distance_m / speed_mps)
}

/// Square, symmetric matrix of whole-meter distances indexed by solver index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DistanceMatrix {
    rows: Vec<Vec<u32>>,
}

impl DistanceMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, from: usize, to: usize) -> Option<u32> {
        self.rows.get(from)?.get(to).copied()
    }

    pub fn rows(&self) -> &[Vec<u32>] {
        &self.rows
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.rows.len();
        self.rows.iter().all(|row| row.len() == n)
            && (0..n).all(|i| self.rows[i][i] == 0 && (0..i).all(|j| self.rows[i][j] == self.rows[j][i]))
    }
}

/// Build the distance matrix for `points` given as (lat, lng) pairs.
///
/// Each upper-triangle entry is truncated toward zero and mirrored into the
/// lower triangle. If any pair fails, no matrix is returned.
pub fn build_distance_matrix(points: &[(f64, f64)]) -> Result<DistanceMatrix> {
    let n = points.len();
    if n == 0 {
        return Ok(DistanceMatrix::default());
    }

    // upper[i] holds distances from i to i+1..n
    let upper = (0..n)
        .into_par_iter()
        .map(|i| {
            let (lat1, lon1) = points[i];
            points[i + 1..]
                .iter()
                .enumerate()
                .map(|(offset, &(lat2, lon2))| {
                    distance(lat1, lon1, lat2, lon2)
                        .map(whole_meters)
                        .map_err(|err| Error::MatrixBuild {
                            from: i,
                            to: i + 1 + offset,
                            reason: err.to_string(),
                        })
                })
                .collect::<Result<Vec<u32>>>()
        })
        .collect::<Result<Vec<Vec<u32>>>>()?;

    let mut rows = vec![vec![0; n]; n];
    for (i, row) in upper.into_iter().enumerate() {
        for (offset, value) in row.into_iter().enumerate() {
            let j = i + 1 + offset;
            rows[i][j] = value;
            rows[j][i] = value;
        }
    }

    tracing::debug!(size = n, "distance matrix created");
    Ok(DistanceMatrix { rows })
}

fn whole_meters(meters: f64) -> u32 {
    meters.trunc().max(0.0) as u32
}
