//! Finished models.
//!
//! A `Model` binds a selected hypothesis to the series it was fit against.
//! Predictions at the series' coordinates are computed on first access and
//! cached; the model is otherwise immutable, so the cache is only ever
//! invalidated by building a new model.

use std::sync::OnceLock;

use crate::domain::{Measurement, Metric, Region};
use crate::models::Hypothesis;

#[derive(Debug, Clone)]
pub struct Model {
    hypothesis: Hypothesis,
    region: Region,
    metric: Metric,
    measurements: Vec<Measurement>,
    predictions: OnceLock<Vec<f64>>,
}

impl Model {
    pub fn new(
        hypothesis: Hypothesis,
        region: Region,
        metric: Metric,
        measurements: Vec<Measurement>,
    ) -> Self {
        Self {
            hypothesis,
            region,
            metric,
            measurements,
            predictions: OnceLock::new(),
        }
    }

    pub fn hypothesis(&self) -> &Hypothesis {
        &self.hypothesis
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Predicted value at every measurement coordinate, in measurement order.
    pub fn predictions(&self) -> &[f64] {
        self.predictions.get_or_init(|| {
            self.measurements
                .iter()
                .map(|m| self.hypothesis.evaluate(m.coordinate().values()))
                .collect()
        })
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.region == other.region
            && self.metric == other.metric
            && self.hypothesis == other.hypothesis
            && self.measurements == other.measurements
    }
}
