//! Data sources.
//!
//! Currently only a seeded synthetic generator, used to exercise the modeler
//! against functions with known structure.

pub mod synthetic;

pub use synthetic::*;
