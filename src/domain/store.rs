//! Measurement store and measurement-set helpers.
//!
//! The store holds, per `(Region, Metric)`, the measurements of one series.
//! It enforces the invariants the modeler relies on:
//!
//! - every coordinate has exactly one component per declared parameter
//! - coordinates are unique within a series

use std::collections::{BTreeMap, HashMap};

use crate::domain::{Measurement, Metric, Parameter, Region};
use crate::error::{ModelingError, Result};

/// Minimum number of distinct parameter values in a single-parameter slice.
pub const MIN_SLICE_POINTS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct MeasurementStore {
    parameters: Vec<Parameter>,
    series: BTreeMap<(Region, Metric), Vec<Measurement>>,
}

impl MeasurementStore {
    pub fn new(parameters: Vec<Parameter>) -> Result<Self> {
        if parameters.is_empty() {
            return Err(ModelingError::invalid("at least one parameter is required"));
        }
        for (i, p) in parameters.iter().enumerate() {
            if parameters[..i].contains(p) {
                return Err(ModelingError::invalid(format!("duplicate parameter '{p}'")));
            }
        }
        Ok(Self {
            parameters,
            series: BTreeMap::new(),
        })
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn dimensions(&self) -> usize {
        self.parameters.len()
    }

    /// Add a measurement to its `(region, metric)` series.
    pub fn insert(&mut self, measurement: Measurement) -> Result<()> {
        let d = measurement.coordinate().dimensions();
        if d != self.dimensions() {
            return Err(ModelingError::invalid(format!(
                "coordinate {} has {d} components, expected {}",
                measurement.coordinate(),
                self.dimensions()
            )));
        }

        let key = (measurement.region().clone(), measurement.metric().clone());
        let series = self.series.entry(key).or_default();
        if series
            .iter()
            .any(|m| m.coordinate() == measurement.coordinate())
        {
            return Err(ModelingError::invalid(format!(
                "duplicate coordinate {} for region '{}' / metric '{}'",
                measurement.coordinate(),
                measurement.region(),
                measurement.metric()
            )));
        }
        series.push(measurement);
        Ok(())
    }

    pub fn get(&self, region: &Region, metric: &Metric) -> Option<&[Measurement]> {
        self.series
            .get(&(region.clone(), metric.clone()))
            .map(|v| v.as_slice())
    }

    /// All `(region, metric)` keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &(Region, Metric)> {
        self.series.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(Region, Metric), &[Measurement])> {
        self.series.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Check a measurement set handed to the modeler and return its dimension.
///
/// Requires a non-empty set with a consistent dimension `D >= 1` and unique
/// coordinates.
pub fn validate_measurements(measurements: &[Measurement]) -> Result<usize> {
    let Some(first) = measurements.first() else {
        return Err(ModelingError::invalid("measurement set is empty"));
    };
    let d = first.coordinate().dimensions();
    if d == 0 {
        return Err(ModelingError::invalid("coordinates have no components"));
    }

    let mut seen = HashMap::with_capacity(measurements.len());
    for (i, m) in measurements.iter().enumerate() {
        if m.coordinate().dimensions() != d {
            return Err(ModelingError::invalid(format!(
                "coordinate {} has {} components, expected {d}",
                m.coordinate(),
                m.coordinate().dimensions()
            )));
        }
        if let Some(prev) = seen.insert(m.coordinate().key(), i) {
            return Err(ModelingError::invalid(format!(
                "coordinate {} appears twice (entries {prev} and {i})",
                m.coordinate()
            )));
        }
    }
    Ok(d)
}

/// Extract the single-parameter view of `parameter`: `(value, observed)` pairs
/// sorted by parameter value.
///
/// Measurements are grouped by the values of all other parameters. The group
/// with the most points is used; ties go to the group whose observations span
/// the widest relative range, then to the group seen first. Returns an empty
/// vector when no group has at least [`MIN_SLICE_POINTS`] points.
///
/// A parameter therefore needs at least [`MIN_SLICE_POINTS`] distinct values
/// along one line of the design (all other coordinates fixed) to take part in
/// a search. A full 2 x 3 grid gives the two-valued parameter no slice, while
/// a cross-shaped 6-point design covers both.
pub fn parameter_slice(
    measurements: &[Measurement],
    parameter: usize,
    use_median: bool,
) -> Vec<(f64, f64)> {
    let mut groups: Vec<(Vec<u64>, Vec<(f64, f64)>)> = Vec::new();
    for m in measurements {
        let c = m.coordinate().values();
        let key: Vec<u64> = c
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != parameter)
            .map(|(_, v)| v.to_bits())
            .collect();
        let point = (c[parameter], m.value(use_median));
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, points)) => points.push(point),
            None => groups.push((key, vec![point])),
        }
    }

    let mut best: Option<(usize, f64, Vec<(f64, f64)>)> = None;
    for (_, points) in groups {
        let spread = relative_spread(&points);
        let better = match &best {
            None => true,
            Some((n, s, _)) => points.len() > *n || (points.len() == *n && spread > *s),
        };
        if better {
            best = Some((points.len(), spread, points));
        }
    }

    match best {
        Some((n, _, mut points)) if n >= MIN_SLICE_POINTS => {
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            points
        }
        _ => Vec::new(),
    }
}

fn relative_spread(points: &[(f64, f64)]) -> f64 {
    let (lo, hi) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.1), hi.max(p.1))
    });
    let scale = lo.abs().max(hi.abs());
    if scale > 0.0 { (hi - lo) / scale } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meas(c: Vec<f64>, v: f64) -> Measurement {
        Measurement::new(c, Region::new("r"), Metric::new("time"), vec![v]).unwrap()
    }

    #[test]
    fn store_rejects_dimension_mismatch_and_duplicates() {
        let mut store =
            MeasurementStore::new(vec![Parameter::new("p"), Parameter::new("n")]).unwrap();
        store.insert(meas(vec![1.0, 2.0], 3.0)).unwrap();
        assert!(store.insert(meas(vec![1.0], 3.0)).is_err());
        assert!(store.insert(meas(vec![1.0, 2.0], 4.0)).is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(
            store
                .get(&Region::new("r"), &Metric::new("time"))
                .map(|s| s.len()),
            Some(1)
        );
    }

    #[test]
    fn store_rejects_duplicate_parameters() {
        assert!(MeasurementStore::new(vec![Parameter::new("p"), Parameter::new("p")]).is_err());
        assert!(MeasurementStore::new(vec![]).is_err());
    }

    #[test]
    fn validate_checks_dimensions() {
        assert!(validate_measurements(&[]).is_err());
        let ok = vec![meas(vec![1.0, 1.0], 1.0), meas(vec![2.0, 1.0], 1.0)];
        assert_eq!(validate_measurements(&ok).unwrap(), 2);
        let bad = vec![meas(vec![1.0, 1.0], 1.0), meas(vec![2.0], 1.0)];
        assert!(validate_measurements(&bad).is_err());
    }

    #[test]
    fn slice_prefers_largest_group() {
        // Line at y=1 has four x values; line at y=2 has three.
        let mut ms = Vec::new();
        for x in [1.0, 2.0, 3.0, 4.0] {
            ms.push(meas(vec![x, 1.0], 10.0 * x));
        }
        for x in [1.0, 2.0, 3.0] {
            ms.push(meas(vec![x, 2.0], 20.0 * x));
        }
        let slice = parameter_slice(&ms, 0, false);
        assert_eq!(slice.len(), 4);
        assert_eq!(slice[3], (4.0, 40.0));
    }

    #[test]
    fn slice_breaks_ties_by_spread() {
        let mut ms = Vec::new();
        for x in [3.0, 1.0, 2.0] {
            // Flat series first, sloped one second.
            ms.push(meas(vec![x, 1.0], 5.0));
            ms.push(meas(vec![x, 2.0], 5.0 * x));
        }
        let slice = parameter_slice(&ms, 0, false);
        assert_eq!(slice, vec![(1.0, 5.0), (2.0, 10.0), (3.0, 15.0)]);
    }

    #[test]
    fn two_valued_parameter_has_no_slice() {
        let mut ms = Vec::new();
        for x in [2.0, 4.0] {
            for y in [2.0, 4.0, 8.0] {
                ms.push(meas(vec![x, y], x * y));
            }
        }
        assert!(parameter_slice(&ms, 0, false).is_empty());
        assert_eq!(parameter_slice(&ms, 1, false).len(), 3);
    }

    #[test]
    fn slice_too_small_is_empty() {
        let ms = vec![meas(vec![1.0, 1.0], 1.0), meas(vec![2.0, 1.0], 2.0)];
        assert!(parameter_slice(&ms, 0, false).is_empty());
    }
}
