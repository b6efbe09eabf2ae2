//! Sample file loading.
//!
//! Accepts comma-separated files (or one value per line). The first column
//! holds the observations; an optional header names the measured quantity.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tolerance_engine::ToleranceError;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSample {
    /// Header of the first column, if the file has one
    pub column: Option<String>,
    /// File name without extension
    pub stem: String,
    pub values: Vec<f64>,
}

pub fn load_sample(path: &Path) -> Result<LoadedSample> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let (column, values) =
        parse_sample(file).with_context(|| format!("cannot read a sample from {}", path.display()))?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sample".to_string());

    tracing::info!(path = %path.display(), n = values.len(), "loaded sample");

    Ok(LoadedSample {
        column,
        stem,
        values,
    })
}

/// Parse the first column of delimited text into observations.
///
/// A first row whose first cell is not a number is taken as the header.
/// Rows with an empty first cell are skipped.
pub fn parse_sample<R: Read>(reader: R) -> Result<(Option<String>, Vec<f64>), ToleranceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut column = None;
    let mut values = Vec::new();

    for (idx, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| ToleranceError::InputFormat(e.to_string()))?;
        let cell = record.get(0).unwrap_or("");
        if cell.is_empty() {
            continue;
        }

        match cell.parse::<f64>() {
            Ok(v) => values.push(v),
            Err(_) if idx == 0 => column = Some(cell.to_string()),
            Err(_) => {
                return Err(ToleranceError::InputFormat(format!(
                    "line {}: '{}' is not a number",
                    idx + 1,
                    cell
                )))
            }
        }
    }

    if values.is_empty() {
        return Err(ToleranceError::InputFormat(
            "no numeric observations in the first column".to_string(),
        ));
    }

    Ok((column, values))
}
