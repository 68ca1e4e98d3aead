//! Request and response types for the route optimization operation.
//!
//! The wire shape mirrors what callers already send: a list of locations whose
//! first element is the depot, plus optional solver overrides.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::RawTimeLimit;
use crate::strategy::{FirstSolutionStrategy, LocalSearchStrategy, StrategyChoice};

/// Opaque caller identifier for a location. Accepts JSON strings or integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationId {
    Number(i64),
    Text(String),
}

impl LocationId {
    /// Short random identifier used when the caller omits one.
    pub fn generate() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(8);
        LocationId::Text(id)
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationId::Number(n) => write!(f, "{n}"),
            LocationId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        LocationId::Text(value.to_string())
    }
}

impl From<String> for LocationId {
    fn from(value: String) -> Self {
        LocationId::Text(value)
    }
}

impl From<i64> for LocationId {
    fn from(value: i64) -> Self {
        LocationId::Number(value)
    }
}

/// A caller-supplied stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default = "LocationId::generate")]
    pub id: LocationId,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(id: impl Into<LocationId>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
        }
    }

    /// Location with an auto-generated id.
    pub fn anonymous(latitude: f64, longitude: f64) -> Self {
        Self::new(LocationId::generate(), latitude, longitude)
    }

    /// Whether latitude lies in [-90, 90] and longitude in [-180, 180].
    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Working record for a location inside a single request.
///
/// `original_index` is the position in the caller's list (0 = depot);
/// `solver_index` is assigned once the depot-first list handed to the engine
/// is fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedStop {
    pub id: LocationId,
    pub latitude: f64,
    pub longitude: f64,
    pub original_index: usize,
    pub solver_index: Option<usize>,
}

impl LocatedStop {
    pub fn new(location: &Location, original_index: usize) -> Self {
        Self {
            id: location.id.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            original_index,
            solver_index: None,
        }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    pub fn is_depot(&self) -> bool {
        self.original_index == 0
    }
}

/// Route optimization request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizeRequest {
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_speed_kmh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlier_threshold_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver_time_limit_seconds: Option<RawTimeLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_solution_strategy: Option<StrategyChoice<FirstSolutionStrategy>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_search_strategy: Option<StrategyChoice<LocalSearchStrategy>>,
}

impl OptimizeRequest {
    pub fn new(locations: Vec<Location>) -> Self {
        Self {
            locations,
            ..Self::default()
        }
    }

    pub fn with_speed(mut self, speed_kmh: f64) -> Self {
        self.average_speed_kmh = Some(speed_kmh);
        self
    }

    pub fn with_outlier_threshold(mut self, threshold_km: f64) -> Self {
        self.outlier_threshold_km = Some(threshold_km);
        self
    }

    pub fn with_time_limit(mut self, time_limit: impl Into<RawTimeLimit>) -> Self {
        self.solver_time_limit_seconds = Some(time_limit.into());
        self
    }

    pub fn with_first_solution_strategy(
        mut self,
        strategy: impl Into<StrategyChoice<FirstSolutionStrategy>>,
    ) -> Self {
        self.first_solution_strategy = Some(strategy.into());
        self
    }

    pub fn with_local_search_strategy(
        mut self,
        strategy: impl Into<StrategyChoice<LocalSearchStrategy>>,
    ) -> Self {
        self.local_search_strategy = Some(strategy.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub id: LocationId,
    pub latitude: f64,
    pub longitude: f64,
    pub original_index: usize,
    /// 1-based position in the tour.
    pub visit_order: usize,
    pub is_depot: bool,
}

impl RoutePoint {
    pub fn from_stop(stop: &LocatedStop, visit_order: usize) -> Self {
        Self {
            id: stop.id.clone(),
            latitude: stop.latitude,
            longitude: stop.longitude,
            original_index: stop.original_index,
            visit_order,
            is_depot: stop.is_depot(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub start_location_id: LocationId,
    pub end_location_id: LocationId,
    pub distance_meters: f64,
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub total_distance_meters: f64,
    pub total_duration_seconds: Option<f64>,
    pub num_locations_optimized: usize,
    pub num_locations_excluded: usize,
    pub depot_id: Option<LocationId>,
    pub calculation_time_seconds: f64,
}

impl RouteSummary {
    /// Summary for outcomes where no route was travelled.
    pub fn zero(
        num_locations_optimized: usize,
        num_locations_excluded: usize,
        depot_id: Option<LocationId>,
        calculation_time_seconds: f64,
    ) -> Self {
        Self {
            total_distance_meters: 0.0,
            total_duration_seconds: Some(0.0),
            num_locations_optimized,
            num_locations_excluded,
            depot_id,
            calculation_time_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub summary: RouteSummary,
    pub route: Vec<RoutePoint>,
    pub legs: Vec<RouteLeg>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SolverParameters;

    #[test]
    fn location_id_accepts_strings_and_integers() {
        let text: Location =
            serde_json::from_str(r#"{"id": "Depot", "latitude": 40.7, "longitude": -74.0}"#)
                .unwrap();
        assert_eq!(text.id, LocationId::Text("Depot".into()));

        let number: Location =
            serde_json::from_str(r#"{"id": 42, "latitude": 40.7, "longitude": -74.0}"#).unwrap();
        assert_eq!(number.id, LocationId::Number(42));
        assert_eq!(serde_json::to_string(&number.id).unwrap(), "42");
    }

    #[test]
    fn missing_id_is_generated() {
        let location: Location =
            serde_json::from_str(r#"{"latitude": 40.7, "longitude": -74.0}"#).unwrap();
        match location.id {
            LocationId::Text(id) => {
                assert_eq!(id.len(), 8);
                assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
            }
            other => panic!("expected generated text id, got {other:?}"),
        }
    }

    #[test]
    fn range_check() {
        assert!(Location::anonymous(90.0, -180.0).in_range());
        assert!(!Location::anonymous(90.5, 0.0).in_range());
        assert!(!Location::anonymous(0.0, 181.0).in_range());
        assert!(!Location::anonymous(f64::NAN, 0.0).in_range());
    }

    #[test]
    fn request_deserializes_overrides() {
        let request: OptimizeRequest = serde_json::from_str(
            r#"{
                "locations": [
                    {"id": "Depot", "latitude": 40.7128, "longitude": -74.0060},
                    {"id": "Stop 1", "latitude": 40.7580, "longitude": -73.9855}
                ],
                "average_speed_kmh": 45.0,
                "outlier_threshold_km": 100.0,
                "solver_time_limit_seconds": "10",
                "local_search_strategy": "TABU_SEARCH",
                "first_solution_strategy": "NOT_A_STRATEGY"
            }"#,
        )
        .unwrap();

        assert_eq!(request.locations.len(), 2);
        assert_eq!(request.average_speed_kmh, Some(45.0));
        assert_eq!(
            request.solver_time_limit_seconds,
            Some(RawTimeLimit::Text("10".into()))
        );
        assert_eq!(
            request.local_search_strategy,
            Some(StrategyChoice::Known(LocalSearchStrategy::TabuSearch))
        );
        assert_eq!(
            request.first_solution_strategy,
            Some(StrategyChoice::Named("NOT_A_STRATEGY".into()))
        );
    }

    #[test]
    fn malformed_overrides_do_not_reject_the_request() {
        for (time_limit, strategy) in [("true", "5"), ("[5]", "{\"name\": \"SWEEP\"}"), ("{}", "false")] {
            let body = format!(
                r#"{{
                    "locations": [{{"id": "Depot", "latitude": 40.7, "longitude": -74.0}}],
                    "solver_time_limit_seconds": {time_limit},
                    "first_solution_strategy": {strategy},
                    "local_search_strategy": {strategy}
                }}"#
            );
            let request: OptimizeRequest = serde_json::from_str(&body)
                .unwrap_or_else(|err| panic!("{time_limit} / {strategy}: {err}"));

            let params = SolverParameters::resolve(
                request.solver_time_limit_seconds.as_ref(),
                request.first_solution_strategy.as_ref(),
                request.local_search_strategy.as_ref(),
                None,
            );
            assert_eq!(params, SolverParameters::default(), "{time_limit} / {strategy}");
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ResponseStatus::Warning).unwrap(),
            "\"warning\""
        );
    }
}
