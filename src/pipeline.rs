//! Route request orchestration.
//!
//! Turns an [`OptimizeRequest`] into an [`OptimizeResponse`]:
//!
//! ```text
//! Received -> Validated -> Filtered -> DepotVerified -> Solving -> Reconciled -> Formatted -> Done
//! ```
//!
//! Empty input, an all-filtered request and a depot-only request end early with
//! a successful (or warning) response. Everything else that ends early is an
//! [`Error`], whose [`Error::stage`] names the terminal state.

use std::fmt;
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn};

use crate::config::{DEFAULT_AVERAGE_SPEED_KMH, ServiceConfig};
use crate::engine::{RouteSolvingEngine, SolveOutcome, normalize_route};
use crate::error::{Error, ErrorCategory, Result};
use crate::haversine::{DistanceMatrix, build_distance_matrix, distance, duration_seconds};
use crate::model::{
    LocatedStop, LocationId, OptimizeRequest, OptimizeResponse, ResponseStatus, RouteLeg,
    RoutePoint, RouteSummary,
};
use crate::outliers::filter_outliers;
use crate::params::SolverParameters;

/// Lifecycle of a single optimization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Filtered,
    DepotVerified,
    Solving,
    Reconciled,
    Formatted,
    Done,
    EmptyInput,
    AllFiltered,
    DepotExcluded,
    SolverUnavailable,
    NoSolutionFound,
    InternalError,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Filtered => "filtered",
            Stage::DepotVerified => "depot_verified",
            Stage::Solving => "solving",
            Stage::Reconciled => "reconciled",
            Stage::Formatted => "formatted",
            Stage::Done => "done",
            Stage::EmptyInput => "empty_input",
            Stage::AllFiltered => "all_filtered",
            Stage::DepotExcluded => "depot_excluded",
            Stage::SolverUnavailable => "solver_unavailable",
            Stage::NoSolutionFound => "no_solution_found",
            Stage::InternalError => "internal_error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Stage::Done
                | Stage::EmptyInput
                | Stage::AllFiltered
                | Stage::DepotExcluded
                | Stage::SolverUnavailable
                | Stage::NoSolutionFound
                | Stage::InternalError
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller's designated start location, tracked by identity rather than
/// by list position.
#[derive(Debug, Clone)]
struct DepotRef {
    id: LocationId,
    original_index: usize,
}

impl DepotRef {
    fn matches(&self, stop: &LocatedStop) -> bool {
        stop.original_index == self.original_index
    }
}

/// Runs optimization requests against a route solving engine.
///
/// Holds no per-request state, so one planner can serve any number of
/// requests, concurrently if `E` allows it.
#[derive(Debug, Clone)]
pub struct RoutePlanner<'c, E> {
    engine: E,
    config: Option<&'c ServiceConfig>,
}

impl<'c, E: RouteSolvingEngine> RoutePlanner<'c, E> {
    pub fn new(engine: E, config: &'c ServiceConfig) -> Self {
        Self {
            engine,
            config: Some(config),
        }
    }

    /// Planner that relies on hard-coded fallbacks only.
    pub fn without_config(engine: E) -> Self {
        Self {
            engine,
            config: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResponse> {
        let started = Instant::now();
        let span = info_span!("optimize", request_id = %uuid::Uuid::new_v4().simple());
        let _entered = span.enter();

        info!(
            stage = %Stage::Received,
            num_locations = request.locations.len(),
            "route request received"
        );

        match self.run(request, started) {
            Ok((stage, response)) => {
                info!(
                    stage = %stage,
                    status = ?response.status,
                    num_locations_optimized = response.summary.num_locations_optimized,
                    num_locations_excluded = response.summary.num_locations_excluded,
                    calculation_time_seconds = response.summary.calculation_time_seconds,
                    "route request finished"
                );
                Ok(response)
            }
            Err(err) => {
                match err.category() {
                    ErrorCategory::ClientInput => {
                        warn!(stage = %err.stage(), error = %err, "route request rejected")
                    }
                    _ => error!(stage = %err.stage(), error = %err, "route request failed"),
                }
                Err(err)
            }
        }
    }

    fn run(&self, request: &OptimizeRequest, started: Instant) -> Result<(Stage, OptimizeResponse)> {
        let locations = &request.locations;
        if let Some((index, location)) = locations
            .iter()
            .enumerate()
            .find(|(_, location)| !location.in_range())
        {
            return Err(Error::InvalidLocation {
                index,
                latitude: location.latitude,
                longitude: location.longitude,
            });
        }

        let Some(first) = locations.first() else {
            return Ok((
                Stage::EmptyInput,
                OptimizeResponse {
                    status: ResponseStatus::Success,
                    message: "Input contained zero locations.".to_string(),
                    summary: RouteSummary::zero(0, 0, None, elapsed_seconds(started)),
                    route: Vec::new(),
                    legs: Vec::new(),
                },
            ));
        };
        let depot = DepotRef {
            id: first.id.clone(),
            original_index: 0,
        };
        debug!(stage = %Stage::Validated, depot_id = %depot.id, "request validated");

        let stops: Vec<LocatedStop> = locations
            .iter()
            .enumerate()
            .map(|(index, location)| LocatedStop::new(location, index))
            .collect();

        let threshold_km = request
            .outlier_threshold_km
            .or_else(|| self.config.and_then(|c| c.default_outlier_threshold_km));
        let kept = match threshold_km {
            Some(threshold) => filter_outliers(stops, threshold),
            None => stops,
        };
        let excluded = locations.len() - kept.len();
        debug!(
            stage = %Stage::Filtered,
            threshold_km = ?threshold_km,
            kept = kept.len(),
            excluded,
            "outlier filtering applied"
        );

        if kept.is_empty() {
            return Ok((
                Stage::AllFiltered,
                OptimizeResponse {
                    status: ResponseStatus::Warning,
                    message: "No locations remained after filtering.".to_string(),
                    summary: RouteSummary::zero(
                        0,
                        excluded,
                        Some(depot.id.clone()),
                        elapsed_seconds(started),
                    ),
                    route: Vec::new(),
                    legs: Vec::new(),
                },
            ));
        }

        let stops = depot_first(kept, &depot, threshold_km)?;
        debug!(stage = %Stage::DepotVerified, num_stops = stops.len(), "depot placed at solver index 0");

        if stops.len() == 1 {
            return Ok((
                Stage::Done,
                OptimizeResponse {
                    status: ResponseStatus::Success,
                    message: "Route contains only the depot location.".to_string(),
                    summary: RouteSummary::zero(
                        1,
                        excluded,
                        Some(depot.id.clone()),
                        elapsed_seconds(started),
                    ),
                    route: vec![RoutePoint::from_stop(&stops[0], 1)],
                    legs: Vec::new(),
                },
            ));
        }

        let params = SolverParameters::resolve(
            request.solver_time_limit_seconds.as_ref(),
            request.first_solution_strategy.as_ref(),
            request.local_search_strategy.as_ref(),
            self.config.map(|c| &c.solver),
        );

        let coords: Vec<(f64, f64)> = stops.iter().map(LocatedStop::coords).collect();
        let matrix = build_distance_matrix(&coords)?;

        info!(
            stage = %Stage::Solving,
            num_stops = stops.len(),
            time_limit_seconds = params.time_limit_seconds,
            first_solution_strategy = %params.first_solution_strategy,
            local_search_strategy = %params.local_search_strategy,
            "invoking route solving engine"
        );
        let (order, cost) = match normalize_route(self.engine.solve(&matrix, 0, &params), 0) {
            SolveOutcome::Solved { order, cost } => (order, cost),
            SolveOutcome::NoSolution { reason } => return Err(Error::NoSolutionFound { reason }),
            SolveOutcome::Unavailable { reason } => return Err(Error::SolverUnavailable { reason }),
        };

        let visited = reconcile(&stops, &order)?;
        debug!(stage = %Stage::Reconciled, route = ?order, total_cost = cost, "solver route reconciled");

        let speed_kmh = self.effective_speed(request.average_speed_kmh);
        let (legs, total_duration) = build_legs(&visited, &matrix, speed_kmh);
        let route: Vec<RoutePoint> = visited
            .iter()
            .enumerate()
            .map(|(position, stop)| RoutePoint::from_stop(stop, position + 1))
            .collect();

        let total_duration_seconds = total_duration.map(|seconds| round_to(seconds, 2));
        debug!(stage = %Stage::Formatted, legs = legs.len(), speed_kmh, "response assembled");

        Ok((
            Stage::Done,
            OptimizeResponse {
                status: ResponseStatus::Success,
                message: format!("Route optimized for {} locations.", route.len()),
                summary: RouteSummary {
                    total_distance_meters: cost,
                    total_duration_seconds,
                    num_locations_optimized: route.len(),
                    num_locations_excluded: excluded,
                    depot_id: Some(depot.id),
                    calculation_time_seconds: elapsed_seconds(started),
                },
                route,
                legs,
            },
        ))
    }

    fn effective_speed(&self, requested: Option<f64>) -> f64 {
        if let Some(speed) = requested.filter(|s| s.is_finite() && *s > 0.0) {
            return speed;
        }
        if let Some(speed) = requested {
            debug!(speed_kmh = speed, "ignoring non-positive speed, using service default");
        }
        self.config
            .map_or(DEFAULT_AVERAGE_SPEED_KMH, |c| c.default_average_speed_kmh)
    }
}

/// Run one request with an optional service configuration.
pub fn optimize_route<E: RouteSolvingEngine>(
    request: &OptimizeRequest,
    engine: E,
    config: Option<&ServiceConfig>,
) -> Result<OptimizeResponse> {
    RoutePlanner { engine, config }.optimize(request)
}

/// Move the depot to the front, keep the others in order, and assign solver
/// indices.
fn depot_first(
    mut stops: Vec<LocatedStop>,
    depot: &DepotRef,
    threshold_km: Option<f64>,
) -> Result<Vec<LocatedStop>> {
    let Some(position) = stops.iter().position(|stop| depot.matches(stop)) else {
        return Err(Error::DepotExcluded {
            depot_id: depot.id.clone(),
            threshold_km,
        });
    };
    if position != 0 {
        let depot_stop = stops.remove(position);
        stops.insert(0, depot_stop);
    }
    for (solver_index, stop) in stops.iter_mut().enumerate() {
        stop.solver_index = Some(solver_index);
    }
    Ok(stops)
}

/// Map solver indices back to stops, requiring every stop exactly once.
fn reconcile<'s>(stops: &'s [LocatedStop], order: &[usize]) -> Result<Vec<&'s LocatedStop>> {
    let mut seen = vec![false; stops.len()];
    let mut visited = Vec::with_capacity(order.len());

    for &solver_index in order {
        let stop = stops.get(solver_index).ok_or(Error::SolverIndexOutOfRange {
            index: solver_index,
            len: stops.len(),
        })?;
        if stop.solver_index != Some(solver_index) {
            return Err(Error::MissingStop { solver_index });
        }
        if std::mem::replace(&mut seen[solver_index], true) {
            return Err(Error::RouteMismatch {
                expected: stops.len(),
                returned: order.len(),
            });
        }
        visited.push(stop);
    }

    if visited.len() != stops.len() {
        return Err(Error::RouteMismatch {
            expected: stops.len(),
            returned: order.len(),
        });
    }
    Ok(visited)
}

/// Closed-tour legs: consecutive stops, then the last stop back to the first.
///
/// Also returns the unrounded total duration, `None` when no leg has one.
fn build_legs(
    visited: &[&LocatedStop],
    matrix: &DistanceMatrix,
    speed_kmh: f64,
) -> (Vec<RouteLeg>, Option<f64>) {
    let n = visited.len();
    let mut total_duration: Option<f64> = None;
    let legs = (0..n)
        .map(|i| {
            let from = visited[i];
            let to = visited[(i + 1) % n];
            let meters = leg_distance(from, to, matrix);
            let seconds = duration_seconds(meters, speed_kmh);
            if let Some(seconds) = seconds {
                *total_duration.get_or_insert(0.0) += seconds;
            }
            RouteLeg {
                start_location_id: from.id.clone(),
                end_location_id: to.id.clone(),
                distance_meters: round_to(meters, 2),
                duration_seconds: seconds.map(|s| round_to(s, 2)),
            }
        })
        .collect();
    (legs, total_duration)
}

fn leg_distance(from: &LocatedStop, to: &LocatedStop, matrix: &DistanceMatrix) -> f64 {
    let lookup = from
        .solver_index
        .zip(to.solver_index)
        .and_then(|(i, j)| matrix.get(i, j));
    if let Some(meters) = lookup {
        return f64::from(meters);
    }

    warn!(from = %from.id, to = %to.id, "distance matrix lookup failed, recomputing leg distance");
    match distance(from.latitude, from.longitude, to.latitude, to.longitude) {
        Ok(meters) => meters,
        Err(err) => {
            error!(from = %from.id, to = %to.id, error = %err, "could not compute leg distance, using 0");
            0.0
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn elapsed_seconds(started: Instant) -> f64 {
    round_to(started.elapsed().as_secs_f64(), 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;

    fn stop(id: &str, lat: f64, lng: f64, original_index: usize) -> LocatedStop {
        LocatedStop::new(&Location::new(id, lat, lng), original_index)
    }

    fn depot() -> DepotRef {
        DepotRef {
            id: "D".into(),
            original_index: 0,
        }
    }

    #[test]
    fn terminal_stages() {
        assert!(Stage::Done.is_terminal());
        assert!(Stage::DepotExcluded.is_terminal());
        assert!(!Stage::Solving.is_terminal());
        assert_eq!(Stage::NoSolutionFound.to_string(), "no_solution_found");
    }

    #[test]
    fn depot_moves_to_front_and_indices_follow_position() {
        let stops = vec![
            stop("A", 0.0, 0.1, 1),
            stop("D", 0.0, 0.0, 0),
            stop("B", 0.0, 0.2, 2),
        ];
        let ordered = depot_first(stops, &depot(), None).unwrap();
        let ids: Vec<String> = ordered.iter().map(|s| s.id.to_string()).collect();
        assert_eq!(ids, vec!["D", "A", "B"]);
        let indices: Vec<Option<usize>> = ordered.iter().map(|s| s.solver_index).collect();
        assert_eq!(indices, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn missing_depot_is_reported_with_threshold() {
        let err = depot_first(vec![stop("A", 0.0, 0.1, 1)], &depot(), Some(5.0)).unwrap_err();
        match err {
            Error::DepotExcluded {
                depot_id,
                threshold_km,
            } => {
                assert_eq!(depot_id, LocationId::from("D"));
                assert_eq!(threshold_km, Some(5.0));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn reconcile_rejects_bad_routes() {
        let stops = depot_first(
            vec![
                stop("D", 0.0, 0.0, 0),
                stop("A", 0.0, 0.1, 1),
                stop("B", 0.0, 0.2, 2),
            ],
            &depot(),
            None,
        )
        .unwrap();

        assert_eq!(reconcile(&stops, &[0, 2, 1]).unwrap().len(), 3);
        assert!(matches!(
            reconcile(&stops, &[0, 5, 1]),
            Err(Error::SolverIndexOutOfRange { index: 5, len: 3 })
        ));
        assert!(matches!(
            reconcile(&stops, &[0, 1, 1]),
            Err(Error::RouteMismatch { .. })
        ));
        assert!(matches!(
            reconcile(&stops, &[0, 1]),
            Err(Error::RouteMismatch {
                expected: 3,
                returned: 2
            })
        ));
    }

    #[test]
    fn legs_close_the_tour_and_fall_back_to_haversine() {
        let mut a = stop("D", 0.0, 0.0, 0);
        a.solver_index = Some(0);
        let mut b = stop("A", 0.0, 0.01, 1);
        b.solver_index = Some(1);

        let matrix = build_distance_matrix(&[a.coords(), b.coords()]).unwrap();
        let (legs, _) = build_legs(&[&a, &b], &matrix, 36.0);
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[1].start_location_id, LocationId::from("A"));
        assert_eq!(legs[1].end_location_id, LocationId::from("D"));
        let meters = f64::from(matrix.get(0, 1).unwrap());
        assert_eq!(legs[0].distance_meters, meters);
        // 36 km/h is 10 m/s
        assert_eq!(legs[0].duration_seconds, Some(round_to(meters / 10.0, 2)));

        // Empty matrix forces the recomputation path.
        let (legs, total) = build_legs(&[&a, &b], &DistanceMatrix::default(), 0.0);
        let exact = distance(0.0, 0.0, 0.0, 0.01).unwrap();
        assert_eq!(legs[0].distance_meters, round_to(exact, 2));
        assert_eq!(legs[0].duration_seconds, None);
        assert_eq!(total, None);
    }

    #[test]
    fn total_duration_is_rounded_once() {
        let mut stops = vec![
            stop("D", 0.0, 0.0, 0),
            stop("A", 0.0, 0.01, 1),
            stop("B", 0.01, 0.0, 2),
        ];
        for (i, s) in stops.iter_mut().enumerate() {
            s.solver_index = Some(i);
        }
        let coords: Vec<(f64, f64)> = stops.iter().map(LocatedStop::coords).collect();
        let matrix = build_distance_matrix(&coords).unwrap();
        let visited: Vec<&LocatedStop> = stops.iter().collect();

        // Legs of 1111, 1572 and 1111 m at 13 km/h.
        let (legs, total) = build_legs(&visited, &matrix, 13.0);
        assert_eq!(total.map(|t| round_to(t, 2)), Some(1050.65));

        let rounded_leg_sum: f64 = legs.iter().filter_map(|leg| leg.duration_seconds).sum();
        assert_eq!(round_to(rounded_leg_sum, 2), 1050.64);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(1234.5678, 2), 1234.57);
        assert_eq!(round_to(0.0004, 3), 0.0);
    }
}
