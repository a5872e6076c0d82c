//! Mathematical utilities: PMNF basis factors, least squares, fit scores.

pub mod basis;
pub mod ols;
pub mod stats;

pub use basis::*;
pub use ols::*;
pub use stats::*;
