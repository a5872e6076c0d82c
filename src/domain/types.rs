//! Shared domain types.
//!
//! Identifiers (`Parameter`, `Region`, `Metric`) are small string newtypes so
//! that a region can never be compared against a metric by accident. The empty
//! string is a legal, explicit "unset" value for regions and metrics.

use std::fmt;
use std::ops::Index;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{ModelingError, Result};
use crate::math::{mean, median};

/// A named dimension of the input space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameter {
    pub name: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Program region (call path) a measurement belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region {
    pub name: String,
}

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The region used when a data set never names one.
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_unset(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Measured quantity (e.g. `time`, `visits`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metric {
    pub name: String,
}

impl Metric {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The metric used when a data set never names one.
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_unset(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A point in parameter space: one value per declared parameter, in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coordinate(Vec<f64>);

impl Coordinate {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Bitwise identity, used for uniqueness checks and grouping.
    pub(crate) fn key(&self) -> Vec<u64> {
        self.0.iter().map(|v| v.to_bits()).collect()
    }
}

impl From<Vec<f64>> for Coordinate {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl Index<usize> for Coordinate {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

/// Repeated observations of one (region, metric) at one coordinate.
///
/// Immutable after construction. `mean` and `median` are computed on first
/// access and cached for the lifetime of the value.
#[derive(Debug, Clone)]
pub struct Measurement {
    coordinate: Coordinate,
    region: Region,
    metric: Metric,
    values: Vec<f64>,
    mean: OnceLock<f64>,
    median: OnceLock<f64>,
}

impl Measurement {
    /// Create a measurement. Requires at least one finite repetition value.
    pub fn new(
        coordinate: impl Into<Coordinate>,
        region: Region,
        metric: Metric,
        values: Vec<f64>,
    ) -> Result<Self> {
        let coordinate = coordinate.into();
        if values.is_empty() {
            return Err(ModelingError::invalid(format!(
                "measurement at {coordinate} has no repetition values"
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ModelingError::invalid(format!(
                "measurement at {coordinate} has a non-finite value"
            )));
        }
        if coordinate.values().iter().any(|v| !v.is_finite()) {
            return Err(ModelingError::invalid(format!(
                "coordinate {coordinate} has a non-finite component"
            )));
        }
        Ok(Self {
            coordinate,
            region,
            metric,
            values,
            mean: OnceLock::new(),
            median: OnceLock::new(),
        })
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    /// Repetition values in the order they were recorded.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn repetitions(&self) -> usize {
        self.values.len()
    }

    pub fn mean(&self) -> f64 {
        *self.mean.get_or_init(|| mean(&self.values))
    }

    pub fn median(&self) -> f64 {
        *self.median.get_or_init(|| median(&self.values))
    }

    /// The value a fit is made against: median or mean.
    pub fn value(&self, use_median: bool) -> f64 {
        if use_median { self.median() } else { self.mean() }
    }
}

impl PartialEq for Measurement {
    fn eq(&self, other: &Self) -> bool {
        self.coordinate == other.coordinate
            && self.region == other.region
            && self.metric == other.metric
            && self.values == other.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(values: Vec<f64>) -> Result<Measurement> {
        Measurement::new(vec![1.0, 2.0], Region::new("main"), Metric::new("time"), values)
    }

    #[test]
    fn measurement_requires_a_repetition() {
        assert!(m(vec![]).is_err());
        assert!(m(vec![f64::NAN]).is_err());
        assert!(m(vec![1.0]).is_ok());
    }

    #[test]
    fn mean_and_median_are_cached_and_consistent() {
        let meas = m(vec![1.0, 2.0, 30.0]).unwrap();
        assert_eq!(meas.mean(), 11.0);
        assert_eq!(meas.median(), 2.0);
        // Second access hits the cache and must agree.
        assert_eq!(meas.mean(), 11.0);
        assert_eq!(meas.value(true), 2.0);
        assert_eq!(meas.value(false), 11.0);

        let copy = meas.clone();
        assert_eq!(copy, meas);
        assert_eq!(copy.median(), 2.0);
    }

    #[test]
    fn unset_identifiers_are_typed() {
        assert!(Region::unset().is_unset());
        assert!(Metric::unset().is_unset());
        assert!(!Region::new("r").is_unset());
    }

    #[test]
    fn coordinate_display() {
        let c = Coordinate::new(vec![1.0, 2.5]);
        assert_eq!(c.to_string(), "(1, 2.5)");
        assert_eq!(c.dimensions(), 2);
        assert_eq!(c[1], 2.5);
    }
}
