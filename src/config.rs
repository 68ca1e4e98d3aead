//! Service configuration.
//!
//! Values come from `ROUTE_PLANNER_*` environment variables, optionally seeded
//! from a `.env` file. Configuration is loaded once per process and is
//! read-only afterwards.
//!
//! | Variable | Default |
//! |---|---|
//! | `ROUTE_PLANNER_APP_NAME` | `Route Planner` |
//! | `ROUTE_PLANNER_DEFAULT_AVERAGE_SPEED_KMH` | `50.0` |
//! | `ROUTE_PLANNER_DEFAULT_OUTLIER_THRESHOLD_KM` | `80.0` (`none` disables) |
//! | `ROUTE_PLANNER_DEFAULT_SOLVER_TIME_LIMIT_SECONDS` | `30` |
//! | `ROUTE_PLANNER_DEFAULT_FIRST_SOLUTION_STRATEGY` | `PATH_CHEAPEST_ARC` |
//! | `ROUTE_PLANNER_DEFAULT_LOCAL_SEARCH_STRATEGY` | `TABU_SEARCH` |
//! | `ROUTE_PLANNER_DEFAULT_RATE_LIMIT` | `10/minute` |
//! | `ROUTE_PLANNER_SOLVER_URL` | unset |

use std::fmt;
use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::params::{
    FALLBACK_FIRST_SOLUTION_STRATEGY, FALLBACK_LOCAL_SEARCH_STRATEGY, FALLBACK_TIME_LIMIT_SECONDS,
};
use crate::strategy::{FirstSolutionStrategy, LocalSearchStrategy};

pub const ENV_PREFIX: &str = "ROUTE_PLANNER_";

pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 50.0;
pub const DEFAULT_OUTLIER_THRESHOLD_KM: f64 = 80.0;

static GLOBAL: OnceCell<ServiceConfig> = OnceCell::new();

/// Service-wide solver defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverDefaults {
    pub time_limit_seconds: u32,
    pub first_solution_strategy: FirstSolutionStrategy,
    pub local_search_strategy: LocalSearchStrategy,
}

impl Default for SolverDefaults {
    fn default() -> Self {
        Self {
            time_limit_seconds: FALLBACK_TIME_LIMIT_SECONDS,
            first_solution_strategy: FALLBACK_FIRST_SOLUTION_STRATEGY,
            local_search_strategy: FALLBACK_LOCAL_SEARCH_STRATEGY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatePeriod {
    Second,
    Minute,
    Hour,
    Day,
}

impl RatePeriod {
    fn as_str(self) -> &'static str {
        match self {
            RatePeriod::Second => "second",
            RatePeriod::Minute => "minute",
            RatePeriod::Hour => "hour",
            RatePeriod::Day => "day",
        }
    }
}

/// A request budget such as `10/minute`. Carried for the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub requests: u32,
    pub period: RatePeriod,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests: 10,
            period: RatePeriod::Minute,
        }
    }
}

impl FromStr for RateLimit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (count, period) = s
            .split_once('/')
            .ok_or_else(|| format!("expected <count>/<period>, got {s:?}"))?;
        let requests = count
            .trim()
            .parse::<u32>()
            .map_err(|err| format!("invalid request count {count:?}: {err}"))?;
        if requests == 0 {
            return Err("request count must be positive".to_string());
        }
        let period = match period.trim().to_ascii_lowercase().as_str() {
            "second" | "seconds" | "s" => RatePeriod::Second,
            "minute" | "minutes" | "m" => RatePeriod::Minute,
            "hour" | "hours" | "h" => RatePeriod::Hour,
            "day" | "days" | "d" => RatePeriod::Day,
            other => return Err(format!("unknown period {other:?}")),
        };
        Ok(Self { requests, period })
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.requests, self.period.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub app_name: String,
    pub default_average_speed_kmh: f64,
    /// `None` disables filtering unless a request asks for it.
    pub default_outlier_threshold_km: Option<f64>,
    pub solver: SolverDefaults,
    pub default_rate_limit: RateLimit,
    /// Base URL of a remote route solving engine.
    pub solver_url: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            app_name: "Route Planner".to_string(),
            default_average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
            default_outlier_threshold_km: Some(DEFAULT_OUTLIER_THRESHOLD_KM),
            solver: SolverDefaults::default(),
            default_rate_limit: RateLimit::default(),
            solver_url: None,
        }
    }
}

impl ServiceConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => info!(path = %path.display(), "loaded environment file"),
            Err(err) if err.not_found() => {}
            Err(err) => warn!(error = %err, "failed to read environment file"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Keys include [`ENV_PREFIX`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(|value| (key, value))
        };

        let mut config = Self::default();

        if let Some((_, value)) = get("APP_NAME") {
            config.app_name = value;
        }
        if let Some((key, value)) = get("DEFAULT_AVERAGE_SPEED_KMH") {
            config.default_average_speed_kmh = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = get("DEFAULT_OUTLIER_THRESHOLD_KM") {
            config.default_outlier_threshold_km = match value.to_ascii_lowercase().as_str() {
                "none" | "off" | "disabled" => None,
                _ => Some(parse_value(&key, &value)?),
            };
        }
        if let Some((key, value)) = get("DEFAULT_SOLVER_TIME_LIMIT_SECONDS") {
            config.solver.time_limit_seconds = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = get("DEFAULT_FIRST_SOLUTION_STRATEGY") {
            config.solver.first_solution_strategy = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = get("DEFAULT_LOCAL_SEARCH_STRATEGY") {
            config.solver.local_search_strategy = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = get("DEFAULT_RATE_LIMIT") {
            config.default_rate_limit = parse_value(&key, &value)?;
        }
        config.solver_url = get("SOLVER_URL").map(|(_, value)| value);

        config.validate()?;
        Ok(config)
    }

    /// Process-wide configuration, loaded from the environment on first use.
    pub fn global() -> Result<&'static ServiceConfig> {
        GLOBAL.get_or_try_init(|| {
            let config = Self::from_env()?;
            info!(
                app_name = %config.app_name,
                default_speed_kmh = config.default_average_speed_kmh,
                default_outlier_threshold_km = ?config.default_outlier_threshold_km,
                default_time_limit_seconds = config.solver.time_limit_seconds,
                default_first_solution_strategy = %config.solver.first_solution_strategy,
                default_local_search_strategy = %config.solver.local_search_strategy,
                default_rate_limit = %config.default_rate_limit,
                "service configuration loaded"
            );
            Ok(config)
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.default_average_speed_kmh.is_finite() || self.default_average_speed_kmh <= 0.0 {
            return Err(config_error(
                "DEFAULT_AVERAGE_SPEED_KMH",
                format!("must be a positive number, got {}", self.default_average_speed_kmh),
            ));
        }
        if let Some(threshold) = self.default_outlier_threshold_km {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(config_error(
                    "DEFAULT_OUTLIER_THRESHOLD_KM",
                    format!("must be a non-negative number or 'none', got {threshold}"),
                ));
            }
        }
        if self.solver.time_limit_seconds == 0 {
            return Err(config_error(
                "DEFAULT_SOLVER_TIME_LIMIT_SECONDS",
                "must be greater than zero",
            ));
        }
        if let Some(url) = &self.solver_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(config_error(
                    "SOLVER_URL",
                    format!("must be an http(s) URL, got {url:?}"),
                ));
            }
        }
        Ok(())
    }
}

fn config_error(name: &str, message: impl Into<String>) -> Error {
    Error::Config {
        key: format!("{ENV_PREFIX}{name}"),
        message: message.into(),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse::<T>().map_err(|err| Error::Config {
        key: key.to_string(),
        message: err.to_string(),
    })
}
