//! Hypothesis search.
//!
//! Responsibilities:
//!
//! - rank single-parameter terms per parameter (`single`)
//! - enumerate multi-parameter term shapes (`combinator`)
//! - fit, prune and cross-validate each shape (`fitter`, `crossval`)
//! - select the best hypothesis in parallel (`selection`)

pub mod combinator;
pub mod crossval;
pub mod fitter;
pub mod selection;
pub mod single;

pub use combinator::*;
pub use crossval::*;
pub use fitter::*;
pub use selection::*;
pub use single::*;
