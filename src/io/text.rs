//! Line-oriented measurement text files.
//!
//! ```text
//! # comment
//! PARAMETER p n
//! POINTS (2 16) (4 16) (8 16)
//! REGION main
//! METRIC time
//! DATA 1.0 1.1 0.9
//! DATA 2.1 2.0 2.2
//! DATA 4.0 4.2 4.1
//! ```
//!
//! - `DATA` lines are matched to `POINTS` in order; the position resets on
//!   every `REGION` and `METRIC` line.
//! - With a single parameter, `POINTS` may list bare values (`POINTS 1 2 4`).
//! - Data before any `REGION`/`METRIC` line goes to the unset region/metric.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::domain::{Measurement, MeasurementStore, Metric, Parameter, Region};
use crate::error::{ModelingError, Result};

/// Parameters the text format can declare.
pub const MAX_TEXT_PARAMETERS: usize = 4;

/// Read a measurement text file.
pub fn read_text_file(path: &Path) -> Result<MeasurementStore> {
    let text = fs::read_to_string(path).map_err(|e| ModelingError::io(path, e))?;
    let store = parse_text(&text)?;
    debug!(
        path = %path.display(),
        series = store.len(),
        parameters = store.dimensions(),
        "read measurement file"
    );
    Ok(store)
}

/// Parse measurement text (see module docs).
pub fn parse_text(input: &str) -> Result<MeasurementStore> {
    let mut parameters: Vec<Parameter> = Vec::new();
    let mut points: Vec<Vec<f64>> = Vec::new();
    let mut region = Region::unset();
    let mut metric = Metric::unset();
    let mut next_point = 0usize;
    let mut store: Option<MeasurementStore> = None;
    let mut last_line = 0;

    for (idx, raw) in input.lines().enumerate() {
        let line = idx + 1;
        last_line = line;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (field, value) = match trimmed.split_once(char::is_whitespace) {
            Some((f, v)) => (f, v.trim()),
            None => (trimmed, ""),
        };
        let err = |message: String| ModelingError::FileFormat { line, message };

        match field {
            "PARAMETER" => {
                if !points.is_empty() {
                    return Err(err("PARAMETER after POINTS".into()));
                }
                parameters.extend(value.split_whitespace().map(Parameter::new));
                if parameters.len() > MAX_TEXT_PARAMETERS {
                    return Err(err(format!(
                        "this format supports at most {MAX_TEXT_PARAMETERS} parameters"
                    )));
                }
            }
            "POINTS" => {
                if parameters.is_empty() {
                    return Err(err("POINTS before any PARAMETER".into()));
                }
                for coordinate in parse_points(value).map_err(err)? {
                    if coordinate.len() != parameters.len() {
                        return Err(err(format!(
                            "point has {} values, expected {}",
                            coordinate.len(),
                            parameters.len()
                        )));
                    }
                    points.push(coordinate);
                }
            }
            "REGION" => {
                region = Region::new(value);
                next_point = 0;
            }
            "METRIC" => {
                metric = Metric::new(value);
                next_point = 0;
            }
            "DATA" => {
                if parameters.is_empty() {
                    return Err(err("DATA before any PARAMETER".into()));
                }
                let Some(coordinate) = points.get(next_point) else {
                    return Err(err(format!(
                        "too many DATA lines ({}) for {} POINTS",
                        next_point + 1,
                        points.len()
                    )));
                };
                let values = parse_numbers(value).map_err(err)?;
                let measurement =
                    Measurement::new(coordinate.clone(), region.clone(), metric.clone(), values)
                        .map_err(|e| err(e.to_string()))?;

                if store.is_none() {
                    let created =
                        MeasurementStore::new(parameters.clone()).map_err(|e| err(e.to_string()))?;
                    store = Some(created);
                }
                if let Some(target) = store.as_mut() {
                    target.insert(measurement).map_err(|e| err(e.to_string()))?;
                }
                next_point += 1;
            }
            other => return Err(err(format!("unknown field '{other}'"))),
        }
    }

    store.ok_or_else(|| ModelingError::FileFormat {
        line: last_line,
        message: "file contains no data".into(),
    })
}

/// `(1 2) (3 4)` or `1 2 3`.
fn parse_points(value: &str) -> std::result::Result<Vec<Vec<f64>>, String> {
    if !value.contains('(') {
        return parse_numbers(value).map(|vs| vs.into_iter().map(|v| vec![v]).collect());
    }
    value
        .split(')')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|group| match group.strip_prefix('(') {
            Some(inner) => parse_numbers(inner),
            None => Err(format!("malformed point '{group}'")),
        })
        .collect()
}

fn parse_numbers(value: &str) -> std::result::Result<Vec<f64>, String> {
    value
        .split_whitespace()
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| format!("'{s}' is not a number"))
        })
        .collect()
}
