//! route-planner core
//!
//! Turns a list of caller-supplied stops into a single-vehicle closed tour that
//! starts and ends at the depot (the first stop). Route search itself is done by
//! a pluggable [`engine::RouteSolvingEngine`].

pub mod config;
pub mod engine;
pub mod error;
pub mod haversine;
pub mod logging;
pub mod model;
pub mod outliers;
pub mod params;
pub mod pipeline;
pub mod strategy;

pub use error::{Error, ErrorCategory, Result};
pub use pipeline::{RoutePlanner, optimize_route};
