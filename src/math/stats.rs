//! Summary statistics and fit scores.

/// Arithmetic mean. `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median (average of the two middle values for even lengths). `NaN` for an
/// empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Mean or median, depending on `use_median`.
pub fn aggregate(values: &[f64], use_median: bool) -> f64 {
    if use_median { median(values) } else { mean(values) }
}

/// Symmetric mean absolute percentage error, in percent.
///
/// Each point contributes `|pred - obs| / ((|pred| + |obs|) / 2)`; a point
/// where both values are zero contributes zero.
pub fn smape(predicted: &[f64], observed: &[f64]) -> f64 {
    debug_assert_eq!(predicted.len(), observed.len());
    if predicted.is_empty() {
        return 0.0;
    }
    let total: f64 = predicted
        .iter()
        .zip(observed)
        .map(|(&p, &o)| {
            let denom = (p.abs() + o.abs()) / 2.0;
            if denom == 0.0 { 0.0 } else { (p - o).abs() / denom }
        })
        .sum();
    total / predicted.len() as f64 * 100.0
}

/// Residual sum of squares.
pub fn rss(predicted: &[f64], observed: &[f64]) -> f64 {
    debug_assert_eq!(predicted.len(), observed.len());
    predicted
        .iter()
        .zip(observed)
        .map(|(&p, &o)| (p - o) * (p - o))
        .sum()
}
