//! Modeler configuration.
//!
//! Options can be built in code (`ModelerOptions::default()` plus field
//! updates) or loaded from a JSON file; missing keys take their defaults.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ModelingError, Result};
use crate::math::DEFAULT_MAX_CONDITION;

/// Hard cap on non-constant terms per hypothesis (5 terms including the constant).
pub const MAX_TERMS: usize = 4;
/// Hard cap on simple terms per compound term.
pub const MAX_SIMPLE_TERMS: usize = 2;
/// Hard cap on parameters taking part in the combination matrix.
pub const MAX_PARAMETERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelerOptions {
    /// Fit against the median of the repetitions instead of the mean.
    pub use_median: bool,
    /// Break near-ties with cross-validated error.
    pub use_crossvalidation: bool,
    /// Allow hypotheses mixing product terms with additive terms.
    pub allow_combinations_of_sums_and_products: bool,
    /// Compare hypotheses by RSS instead of SMAPE.
    #[serde(alias = "compare_with_RSS")]
    pub compare_with_rss: bool,
    /// Minimum measurement points before any fit is attempted.
    pub min_measurement_points: usize,
    /// Minimum relative contribution a term needs to survive pruning.
    pub epsilon: f64,
    /// Relative score difference below which two hypotheses are near-tied.
    pub tie_tolerance: f64,
    /// Maximum number of non-constant terms per hypothesis (1..=4).
    pub max_terms: usize,
    /// Maximum number of parameters (1..=5).
    pub max_parameters: usize,
    /// Condition number beyond which a basis is treated as degenerate.
    pub max_condition_number: f64,
    /// Stop dispatching new candidates after this many milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for ModelerOptions {
    fn default() -> Self {
        Self {
            use_median: false,
            use_crossvalidation: true,
            allow_combinations_of_sums_and_products: true,
            compare_with_rss: false,
            min_measurement_points: 5,
            epsilon: 0.0005,
            tie_tolerance: 0.01,
            max_terms: MAX_TERMS,
            max_parameters: MAX_PARAMETERS,
            max_condition_number: DEFAULT_MAX_CONDITION,
            timeout_ms: None,
        }
    }
}

impl ModelerOptions {
    /// Load options from a JSON file and validate them.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| ModelingError::io(path, e))?;
        let options: ModelerOptions = serde_json::from_reader(file)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_measurement_points == 0 {
            return Err(ModelingError::invalid("min_measurement_points must be >= 1"));
        }
        if !(self.epsilon.is_finite() && (0.0..1.0).contains(&self.epsilon)) {
            return Err(ModelingError::invalid(format!(
                "epsilon must be in [0, 1), got {}",
                self.epsilon
            )));
        }
        if !(self.tie_tolerance.is_finite() && self.tie_tolerance >= 0.0) {
            return Err(ModelingError::invalid(format!(
                "tie_tolerance must be finite and >= 0, got {}",
                self.tie_tolerance
            )));
        }
        if !(1..=MAX_TERMS).contains(&self.max_terms) {
            return Err(ModelingError::invalid(format!(
                "max_terms must be in 1..={MAX_TERMS}, got {}",
                self.max_terms
            )));
        }
        if !(1..=MAX_PARAMETERS).contains(&self.max_parameters) {
            return Err(ModelingError::invalid(format!(
                "max_parameters must be in 1..={MAX_PARAMETERS}, got {}",
                self.max_parameters
            )));
        }
        if !(self.max_condition_number.is_finite() && self.max_condition_number > 1.0) {
            return Err(ModelingError::invalid("max_condition_number must be finite and > 1"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let o = ModelerOptions::default();
        o.validate().unwrap();
        assert_eq!(o.min_measurement_points, 5);
        assert_eq!(o.epsilon, 0.0005);
        assert!(o.use_crossvalidation);
        assert!(o.allow_combinations_of_sums_and_products);
        assert!(!o.compare_with_rss);
    }

    #[test]
    fn partial_json_takes_defaults() {
        let o: ModelerOptions =
            serde_json::from_str(r#"{ "use_median": true, "compare_with_RSS": true }"#).unwrap();
        assert!(o.use_median);
        assert!(o.compare_with_rss);
        assert_eq!(o.max_terms, MAX_TERMS);
    }

    #[test]
    fn caps_cannot_be_raised() {
        let o = ModelerOptions {
            max_terms: 5,
            ..ModelerOptions::default()
        };
        assert!(o.validate().is_err());

        let o = ModelerOptions {
            max_parameters: 6,
            ..ModelerOptions::default()
        };
        assert!(o.validate().is_err());
    }

    #[test]
    fn bad_epsilon_rejected() {
        let o = ModelerOptions {
            epsilon: -1.0,
            ..ModelerOptions::default()
        };
        assert!(o.validate().is_err());
    }
}
