//! Synthetic measurement generation from a known PMNF function.
//!
//! Each coordinate of a Cartesian grid gets `repetitions` noisy observations:
//!
//! `y = f(c) * exp(sigma * z - sigma^2 / 2)`, `z ~ N(0, 1)`
//!
//! so the noise is multiplicative and mean-preserving. Optionally, single
//! repetitions are replaced by outliers (`y * outlier_factor`).

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Measurement, Metric, Region};
use crate::error::{ModelingError, Result};
use crate::models::PmnfFunction;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    /// Values per parameter; the grid is their Cartesian product.
    pub axes: Vec<Vec<f64>>,
    pub repetitions: usize,
    /// Log-normal sigma; `0` gives exact values.
    pub noise: f64,
    /// Probability that a single repetition is an outlier.
    pub outlier_probability: f64,
    pub outlier_factor: f64,
    pub seed: u64,
}

impl SyntheticSpec {
    /// Noise-free, one repetition per coordinate.
    pub fn exact(axes: Vec<Vec<f64>>) -> Self {
        Self {
            axes,
            repetitions: 1,
            noise: 0.0,
            outlier_probability: 0.0,
            outlier_factor: 1.0,
            seed: 0,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.axes.is_empty() || self.axes.iter().any(Vec::is_empty) {
            return Err(ModelingError::invalid("every parameter axis needs at least one value"));
        }
        if self.repetitions == 0 {
            return Err(ModelingError::invalid("repetitions must be > 0"));
        }
        if !(self.noise.is_finite() && self.noise >= 0.0) {
            return Err(ModelingError::invalid("noise must be finite and >= 0"));
        }
        if !(0.0..=1.0).contains(&self.outlier_probability) {
            return Err(ModelingError::invalid("outlier probability must be in [0, 1]"));
        }
        if !self.outlier_factor.is_finite() {
            return Err(ModelingError::invalid("outlier factor must be finite"));
        }
        Ok(())
    }
}

/// Generate one measurement per grid coordinate, in row-major order (the last
/// parameter varies fastest).
pub fn generate_measurements(
    function: &PmnfFunction,
    spec: &SyntheticSpec,
    region: &Region,
    metric: &Metric,
) -> Result<Vec<Measurement>> {
    spec.validate()?;
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ModelingError::invalid(format!("noise distribution error: {e}")))?;
    let correction = 0.5 * spec.noise * spec.noise;

    let grid = cartesian(&spec.axes);
    let mut out = Vec::with_capacity(grid.len());
    for coordinate in grid {
        let truth = function.evaluate(&coordinate);
        if !truth.is_finite() {
            return Err(ModelingError::invalid(format!(
                "function is not finite at {coordinate:?}"
            )));
        }

        let mut values = Vec::with_capacity(spec.repetitions);
        for _ in 0..spec.repetitions {
            let mut y = truth;
            if spec.noise > 0.0 {
                let z = normal.sample(&mut rng);
                y *= (spec.noise * z - correction).exp();
            }
            if spec.outlier_probability > 0.0 && rng.gen_bool(spec.outlier_probability) {
                y *= spec.outlier_factor;
            }
            values.push(y);
        }
        out.push(Measurement::new(coordinate, region.clone(), metric.clone(), values)?);
    }
    Ok(out)
}

fn cartesian(axes: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut out: Vec<Vec<f64>> = vec![Vec::new()];
    for axis in axes {
        out = out
            .iter()
            .flat_map(|prefix| {
                axis.iter().map(move |&v| {
                    let mut c = prefix.clone();
                    c.push(v);
                    c
                })
            })
            .collect();
    }
    out
}
