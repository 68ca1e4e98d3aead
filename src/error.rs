//! Error types for the route request pipeline.
//!
//! Every failure carries an [`ErrorCategory`] so the calling transport can map
//! it to a caller-visible signal without re-deriving the cause.

use thiserror::Error;

use crate::model::LocationId;
use crate::pipeline::Stage;

/// Convenient result alias for the route planner.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request itself cannot be routed as given.
    ClientInput,
    /// The route solving engine cannot produce a route right now.
    UpstreamUnavailable,
    /// Contract violation between pipeline components.
    Internal,
}

impl ErrorCategory {
    /// HTTP-class status code conventionally used for this category.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCategory::ClientInput => 400,
            ErrorCategory::UpstreamUnavailable => 503,
            ErrorCategory::Internal => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::ClientInput => "client_input",
            ErrorCategory::UpstreamUnavailable => "upstream_unavailable",
            ErrorCategory::Internal => "internal",
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A coordinate handed to the distance engine was NaN or infinite.
    #[error("invalid coordinate ({latitude}, {longitude}): latitude and longitude must be finite numbers")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// A caller-supplied location is out of range.
    #[error(
        "location {index} has invalid coordinates ({latitude}, {longitude}); latitude must be within [-90, 90] and longitude within [-180, 180]"
    )]
    InvalidLocation {
        index: usize,
        latitude: f64,
        longitude: f64,
    },

    /// The outlier filter removed the depot.
    #[error(
        "the designated start location (depot id: {depot_id}) was excluded by the outlier filter (threshold: {}); cannot create a route starting from it",
        format_threshold(.threshold_km)
    )]
    DepotExcluded {
        depot_id: LocationId,
        threshold_km: Option<f64>,
    },

    #[error("failed to build distance matrix at ({from}, {to}): {reason}")]
    MatrixBuild {
        from: usize,
        to: usize,
        reason: String,
    },

    /// The route solving engine could not be invoked at all.
    #[error("route solving engine unavailable: {reason}")]
    SolverUnavailable { reason: String },

    /// The engine ran but produced no feasible route.
    #[error("route solving engine did not find a solution: {reason}")]
    NoSolutionFound { reason: String },

    #[error("solver returned index {index} outside of the {len} submitted locations")]
    SolverIndexOutOfRange { index: usize, len: usize },

    /// The returned route does not visit every submitted location exactly once.
    #[error(
        "solver route has {returned} entries but must visit each of the {expected} submitted locations exactly once"
    )]
    RouteMismatch { expected: usize, returned: usize },

    #[error("no location metadata for solver index {solver_index}")]
    MissingStop { solver_index: usize },

    #[error("unknown {kind} strategy: {name}")]
    UnknownStrategy { kind: &'static str, name: String },

    /// Raised while loading service configuration.
    #[error("invalid configuration value for {key}: {message}")]
    Config { key: String, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidLocation { .. }
            | Error::DepotExcluded { .. }
            | Error::UnknownStrategy { .. } => ErrorCategory::ClientInput,
            Error::SolverUnavailable { .. } | Error::NoSolutionFound { .. } | Error::Http(_) => {
                ErrorCategory::UpstreamUnavailable
            }
            Error::InvalidCoordinate { .. }
            | Error::MatrixBuild { .. }
            | Error::SolverIndexOutOfRange { .. }
            | Error::RouteMismatch { .. }
            | Error::MissingStop { .. }
            | Error::Config { .. } => ErrorCategory::Internal,
        }
    }

    pub fn http_status(&self) -> u16 {
        self.category().http_status()
    }

    /// Terminal pipeline stage this error ends a request in.
    pub fn stage(&self) -> Stage {
        match self {
            Error::DepotExcluded { .. } => Stage::DepotExcluded,
            Error::SolverUnavailable { .. } | Error::Http(_) => Stage::SolverUnavailable,
            Error::NoSolutionFound { .. } => Stage::NoSolutionFound,
            Error::InvalidLocation { .. } | Error::UnknownStrategy { .. } => Stage::Received,
            _ => Stage::InternalError,
        }
    }
}

fn format_threshold(threshold_km: &Option<f64>) -> String {
    match threshold_km {
        Some(km) => format!("{km} km"),
        None => "none".to_string(),
    }
}
