//! Solver parameter resolution.
//!
//! Each parameter is resolved from an ordered list of providers: the request,
//! then the service defaults. The first provider with a valid value wins; when
//! none has an opinion, the hard-coded fallback is used. Invalid request values
//! never raise, they only fall through to the next tier.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SolverDefaults;
use crate::strategy::{FirstSolutionStrategy, LocalSearchStrategy, Strategy, StrategyChoice};

/// Used only when no service configuration is available.
pub const FALLBACK_TIME_LIMIT_SECONDS: u32 = 30;
pub const FALLBACK_FIRST_SOLUTION_STRATEGY: FirstSolutionStrategy =
    FirstSolutionStrategy::PathCheapestArc;
pub const FALLBACK_LOCAL_SEARCH_STRATEGY: LocalSearchStrategy = LocalSearchStrategy::TabuSearch;

/// A time limit as sent by the caller, before coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimeLimit {
    Integer(i64),
    Float(f64),
    Text(String),
    /// Any other JSON value (bool, array, object). Never coerces.
    Other(serde_json::Value),
}

impl RawTimeLimit {
    /// Coerce to a positive whole number of seconds.
    ///
    /// Stringify, parse as float, truncate toward zero. `None` when parsing
    /// fails or the result is not positive.
    pub fn coerce(&self) -> Option<u32> {
        let text = self.to_string();
        let value = text.trim().parse::<f64>().ok()?;
        if !value.is_finite() {
            return None;
        }
        let seconds = value.trunc();
        if seconds <= 0.0 || seconds > f64::from(u32::MAX) {
            return None;
        }
        Some(seconds as u32)
    }
}

impl fmt::Display for RawTimeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTimeLimit::Integer(v) => write!(f, "{v}"),
            RawTimeLimit::Float(v) => write!(f, "{v}"),
            RawTimeLimit::Text(v) => f.write_str(v),
            RawTimeLimit::Other(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for RawTimeLimit {
    fn from(value: i64) -> Self {
        RawTimeLimit::Integer(value)
    }
}

impl From<f64> for RawTimeLimit {
    fn from(value: f64) -> Self {
        RawTimeLimit::Float(value)
    }
}

impl From<&str> for RawTimeLimit {
    fn from(value: &str) -> Self {
        RawTimeLimit::Text(value.to_string())
    }
}

/// Which precedence tier a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterSource {
    Request,
    ServiceDefault,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ParameterSource,
}

/// A single tier of the cascade: returns a validated value or no opinion.
type Provider<'a, T> = (ParameterSource, Box<dyn Fn() -> Option<T> + 'a>);

fn provider<'a, T>(
    source: ParameterSource,
    opinion: impl Fn() -> Option<T> + 'a,
) -> Provider<'a, T> {
    (source, Box::new(opinion))
}

fn first_opinion<T>(providers: Vec<Provider<'_, T>>, fallback: T) -> Resolved<T> {
    providers
        .into_iter()
        .find_map(|(source, provider)| provider().map(|value| Resolved { value, source }))
        .unwrap_or(Resolved {
            value: fallback,
            source: ParameterSource::Fallback,
        })
}

pub fn resolve_time_limit(
    requested: Option<&RawTimeLimit>,
    defaults: Option<&SolverDefaults>,
) -> Resolved<u32> {
    first_opinion(
        vec![
            provider(ParameterSource::Request, move || {
                let raw = requested?;
                let coerced = raw.coerce();
                if coerced.is_none() {
                    warn!(value = %raw, "ignoring invalid solver time limit");
                }
                coerced
            }),
            provider(ParameterSource::ServiceDefault, move || {
                defaults.map(|d| d.time_limit_seconds).filter(|s| *s > 0)
            }),
        ],
        FALLBACK_TIME_LIMIT_SECONDS,
    )
}

fn resolve_strategy<T: Strategy>(
    requested: Option<&StrategyChoice<T>>,
    service_default: Option<T>,
    fallback: T,
) -> Resolved<T> {
    first_opinion(
        vec![
            provider(ParameterSource::Request, move || {
                let choice = requested?;
                let resolved = choice.resolve();
                if resolved.is_none() {
                    warn!(
                        kind = T::KIND,
                        requested = ?choice,
                        "unsupported strategy requested, using default"
                    );
                }
                resolved
            }),
            provider(ParameterSource::ServiceDefault, move || service_default),
        ],
        fallback,
    )
}

pub fn resolve_first_solution_strategy(
    requested: Option<&StrategyChoice<FirstSolutionStrategy>>,
    defaults: Option<&SolverDefaults>,
) -> Resolved<FirstSolutionStrategy> {
    resolve_strategy(
        requested,
        defaults.map(|d| d.first_solution_strategy),
        FALLBACK_FIRST_SOLUTION_STRATEGY,
    )
}

pub fn resolve_local_search_strategy(
    requested: Option<&StrategyChoice<LocalSearchStrategy>>,
    defaults: Option<&SolverDefaults>,
) -> Resolved<LocalSearchStrategy> {
    resolve_strategy(
        requested,
        defaults.map(|d| d.local_search_strategy),
        FALLBACK_LOCAL_SEARCH_STRATEGY,
    )
}

/// Fully resolved configuration handed to the route solving engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SolverParameters {
    pub time_limit_seconds: u32,
    pub first_solution_strategy: FirstSolutionStrategy,
    pub local_search_strategy: LocalSearchStrategy,
}

impl Default for SolverParameters {
    fn default() -> Self {
        Self {
            time_limit_seconds: FALLBACK_TIME_LIMIT_SECONDS,
            first_solution_strategy: FALLBACK_FIRST_SOLUTION_STRATEGY,
            local_search_strategy: FALLBACK_LOCAL_SEARCH_STRATEGY,
        }
    }
}

impl SolverParameters {
    pub fn resolve(
        time_limit: Option<&RawTimeLimit>,
        first_solution: Option<&StrategyChoice<FirstSolutionStrategy>>,
        local_search: Option<&StrategyChoice<LocalSearchStrategy>>,
        defaults: Option<&SolverDefaults>,
    ) -> Self {
        let time_limit = resolve_time_limit(time_limit, defaults);
        let first_solution = resolve_first_solution_strategy(first_solution, defaults);
        let local_search = resolve_local_search_strategy(local_search, defaults);

        debug!(
            time_limit_seconds = time_limit.value,
            time_limit_source = ?time_limit.source,
            first_solution_strategy = %first_solution.value,
            first_solution_source = ?first_solution.source,
            local_search_strategy = %local_search.value,
            local_search_source = ?local_search.source,
            "resolved solver parameters"
        );

        Self {
            time_limit_seconds: time_limit.value,
            first_solution_strategy: first_solution.value,
            local_search_strategy: local_search.value,
        }
    }
}
