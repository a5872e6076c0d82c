//! Read/write model JSON files.
//!
//! A model file is the portable representation of a selected model:
//! - region, metric and parameter names
//! - the hypothesis in flat interchange form
//! - its training scores
//!
//! Only flattenable hypotheses can be written.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{Metric, Parameter, Region};
use crate::error::{ModelingError, Result};
use crate::io::interchange::FlatHypothesis;
use crate::models::{Hypothesis, Model, PmnfFunction};

pub const TOOL_NAME: &str = "pmnf-modeler";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub region: Region,
    pub metric: Metric,
    pub parameters: Vec<Parameter>,
    pub hypothesis: FlatHypothesis,
    pub smape: f64,
    pub rss: f64,
}

impl ModelFile {
    pub fn from_model(model: &Model, parameters: &[Parameter]) -> Result<Self> {
        let dims = model
            .measurements()
            .first()
            .map_or(parameters.len(), |m| m.coordinate().dimensions());
        if dims != parameters.len() {
            return Err(ModelingError::invalid(format!(
                "model has {dims} parameters, {} names given",
                parameters.len()
            )));
        }
        let h = model.hypothesis();
        Ok(Self {
            tool: TOOL_NAME.to_string(),
            region: model.region().clone(),
            metric: model.metric().clone(),
            parameters: parameters.to_vec(),
            hypothesis: FlatHypothesis::encode(&h.function, dims)?,
            smape: h.smape,
            rss: h.rss,
        })
    }

    pub fn to_function(&self) -> Result<PmnfFunction> {
        self.hypothesis.decode(self.parameters.len())
    }

    /// The stored hypothesis with its recorded scores.
    pub fn to_hypothesis(&self) -> Result<Hypothesis> {
        Ok(Hypothesis::new(self.to_function()?, self.smape, self.rss))
    }
}

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &Model, parameters: &[Parameter]) -> Result<()> {
    let file = File::create(path).map_err(|e| ModelingError::io(path, e))?;
    let contents = ModelFile::from_model(model, parameters)?;
    serde_json::to_writer_pretty(file, &contents)?;
    Ok(())
}

/// Read a model JSON file.
pub fn read_model_json(path: &Path) -> Result<ModelFile> {
    let file = File::open(path).map_err(|e| ModelingError::io(path, e))?;
    let contents: ModelFile = serde_json::from_reader(file)?;
    Ok(contents)
}
