//! `pmnf-modeler` library crate.
//!
//! Empirical performance models in Performance Model Normal Form (PMNF) for
//! measurements over several parameters:
//!
//! - measurements are grouped per `(region, metric)` series (`domain`)
//! - each series is searched for the best PMNF hypothesis (`fit`)
//! - models are exchanged as flat arrays, JSON, or C declarations (`io`)
//!
//! ```no_run
//! use std::path::Path;
//! use pmnf_modeler::{ModelSelector, ModelerOptions, read_text_file};
//!
//! # fn main() -> pmnf_modeler::Result<()> {
//! let store = read_text_file(Path::new("measurements.txt"))?;
//! let selector = ModelSelector::new(ModelerOptions::default())?;
//! for (_, series) in store.iter() {
//!     let (model, _) = selector.create_model(series.to_vec())?;
//!     println!("{}", model.hypothesis().function.display_with(store.parameters()));
//! }
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;

pub use domain::{Measurement, MeasurementStore, Metric, ModelerOptions, Parameter, Region};
pub use error::{ModelingError, ModelingWarning, Result};
pub use fit::{ModelSelector, SelectionOutcome, create_model};
pub use io::{FlatHypothesis, emit_c_arrays, read_text_file};
pub use models::{Hypothesis, Model, PmnfFunction};
