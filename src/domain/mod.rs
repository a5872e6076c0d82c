//! Domain types used throughout the modeler.
//!
//! This module defines:
//!
//! - identifiers and coordinates (`Parameter`, `Region`, `Metric`, `Coordinate`)
//! - immutable repeated observations (`Measurement`)
//! - the per-series measurement container (`MeasurementStore`)
//! - modeler configuration (`ModelerOptions`)

pub mod config;
pub mod store;
pub mod types;

pub use config::*;
pub use store::*;
pub use types::*;
