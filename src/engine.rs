//! Route solving engine boundary.
//!
//! The engine owns all search logic. The pipeline only hands it a distance
//! matrix, the depot index and the resolved parameters, and then checks what
//! comes back before trusting it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::haversine::DistanceMatrix;
use crate::params::SolverParameters;
use crate::strategy::{FirstSolutionStrategy, LocalSearchStrategy};

/// Result of one engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// Visiting order as matrix indices, plus the engine's objective value.
    Solved { order: Vec<usize>, cost: f64 },
    /// The engine ran but found no feasible route.
    NoSolution { reason: String },
    /// The engine could not be invoked at all.
    Unavailable { reason: String },
}

/// Single-vehicle route solver over a symmetric distance matrix.
pub trait RouteSolvingEngine {
    fn solve(
        &self,
        matrix: &DistanceMatrix,
        depot: usize,
        params: &SolverParameters,
    ) -> SolveOutcome;

    /// Whether the engine can currently be invoked.
    fn is_available(&self) -> bool {
        true
    }
}

impl<E: RouteSolvingEngine + ?Sized> RouteSolvingEngine for &E {
    fn solve(
        &self,
        matrix: &DistanceMatrix,
        depot: usize,
        params: &SolverParameters,
    ) -> SolveOutcome {
        (**self).solve(matrix, depot, params)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

impl<E: RouteSolvingEngine + ?Sized> RouteSolvingEngine for Box<E> {
    fn solve(
        &self,
        matrix: &DistanceMatrix,
        depot: usize,
        params: &SolverParameters,
    ) -> SolveOutcome {
        (**self).solve(matrix, depot, params)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// Check a solved outcome and repair what can be repaired.
///
/// An empty order, a missing depot, or an invalid cost becomes
/// [`SolveOutcome::NoSolution`]. When the depot is present but not first, the
/// closed tour is rotated so that it leads. Index range checks are left to the
/// caller, which owns the index space.
pub fn normalize_route(outcome: SolveOutcome, depot: usize) -> SolveOutcome {
    let SolveOutcome::Solved { mut order, cost } = outcome else {
        return outcome;
    };

    if order.is_empty() {
        error!("engine reported success but returned an empty route");
        return SolveOutcome::NoSolution {
            reason: "engine returned an empty route".to_string(),
        };
    }
    if !cost.is_finite() || cost < 0.0 {
        error!(cost, "engine returned an invalid total cost");
        return SolveOutcome::NoSolution {
            reason: format!("engine returned invalid total cost {cost}"),
        };
    }

    match order.iter().position(|&index| index == depot) {
        Some(0) => {}
        Some(position) => {
            warn!(position, route = ?order, "route does not start at the depot, rotating");
            order.rotate_left(position);
        }
        None => {
            error!(depot, route = ?order, "depot missing from engine route");
            return SolveOutcome::NoSolution {
                reason: format!("depot index {depot} missing from engine route"),
            };
        }
    }

    SolveOutcome::Solved { order, cost }
}

/// Stand-in used when no engine is configured.
#[derive(Debug, Clone, Default)]
pub struct UnavailableEngine;

impl RouteSolvingEngine for UnavailableEngine {
    fn solve(&self, _: &DistanceMatrix, _: usize, _: &SolverParameters) -> SolveOutcome {
        SolveOutcome::Unavailable {
            reason: "no route solving engine is configured".to_string(),
        }
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct HttpSolverConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    /// Added to the solver time limit to get the request timeout.
    pub timeout_overhead_secs: u64,
}

impl Default for HttpSolverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8500".to_string(),
            connect_timeout_secs: 5,
            timeout_overhead_secs: 10,
        }
    }
}

impl HttpSolverConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Route solving engine reached over HTTP.
///
/// `POST {base_url}/solve` with the matrix and parameters as JSON;
/// `GET {base_url}/health` for availability.
#[derive(Debug, Clone)]
pub struct HttpSolverEngine {
    config: HttpSolverConfig,
    client: reqwest::blocking::Client,
}

impl HttpSolverEngine {
    pub fn new(config: HttpSolverConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

impl RouteSolvingEngine for HttpSolverEngine {
    fn solve(
        &self,
        matrix: &DistanceMatrix,
        depot: usize,
        params: &SolverParameters,
    ) -> SolveOutcome {
        let body = SolveRequestBody {
            distance_matrix: matrix,
            depot,
            time_limit_seconds: params.time_limit_seconds,
            first_solution_strategy: params.first_solution_strategy,
            local_search_strategy: params.local_search_strategy,
        };
        let timeout = Duration::from_secs(
            u64::from(params.time_limit_seconds) + self.config.timeout_overhead_secs,
        );

        info!(
            url = %self.endpoint("solve"),
            size = matrix.len(),
            time_limit_seconds = params.time_limit_seconds,
            "calling route solving engine"
        );

        let response = self
            .client
            .post(self.endpoint("solve"))
            .timeout(timeout)
            .json(&body)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<SolveResponseBody>());

        match response {
            Ok(body) => body.into_outcome(),
            Err(err) => {
                error!(error = %err, "route solving engine request failed");
                SolveOutcome::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn is_available(&self) -> bool {
        let healthy = self
            .client
            .get(self.endpoint("health"))
            .timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false);
        debug!(healthy, "route solving engine health check");
        healthy
    }
}

#[derive(Debug, Serialize)]
struct SolveRequestBody<'a> {
    distance_matrix: &'a DistanceMatrix,
    depot: usize,
    time_limit_seconds: u32,
    first_solution_strategy: FirstSolutionStrategy,
    local_search_strategy: LocalSearchStrategy,
}

#[derive(Debug, Deserialize)]
struct SolveResponseBody {
    status: String,
    #[serde(default)]
    route: Option<Vec<usize>>,
    #[serde(default)]
    total_cost: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

impl SolveResponseBody {
    fn into_outcome(self) -> SolveOutcome {
        match (self.status.as_str(), self.route, self.total_cost) {
            ("success", Some(order), Some(cost)) if !order.is_empty() => {
                SolveOutcome::Solved { order, cost }
            }
            (status, _, _) => SolveOutcome::NoSolution {
                reason: self
                    .message
                    .unwrap_or_else(|| format!("engine finished with status {status}")),
            },
        }
    }
}
