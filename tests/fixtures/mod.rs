//! Shared fixtures for route-planner integration tests.
//!
//! - Real Las Vegas / Henderson stops (from OpenStreetMap)
//! - Deterministic route solving engines

#![allow(dead_code)]

pub mod engines;
pub mod las_vegas;

pub use engines::*;
pub use las_vegas::*;
