//! Input/output helpers.
//!
//! - measurement text files (`text`)
//! - flat interchange form and C array rendering (`interchange`)
//! - model JSON read/write (`model_file`)

pub mod interchange;
pub mod model_file;
pub mod text;

pub use interchange::*;
pub use model_file::*;
pub use text::*;
