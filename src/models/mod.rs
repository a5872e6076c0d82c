//! PMNF model representation.
//!
//! Terms, functions and hypotheses are small value types so that the search
//! code can stay generic: the fitter only needs "evaluate the basis of a term
//! at a coordinate" and "evaluate a function at a coordinate".

pub mod fraction;
pub mod hypothesis;
pub mod model;
pub mod terms;

pub use fraction::*;
pub use hypothesis::*;
pub use model::*;
pub use terms::*;
