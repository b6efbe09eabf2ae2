//! Result files: the rendered chart and the summary table.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tolerance_engine::ToleranceResult;

use crate::render::{self, RenderOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub plot: PathBuf,
    pub summary: PathBuf,
}

/// File names carry the sample name, sidedness, alpha and proportion, e.g.
/// `Lot 7 Two Sided Tolerance Interval_alpha 0.05_proportion 0.95.svg`.
pub fn output_paths(dir: &Path, stem: &str, result: &ToleranceResult) -> OutputPaths {
    let side = result.sidedness.label();
    let suffix = format!("_alpha {}_proportion {}", result.alpha, result.p);
    OutputPaths {
        plot: dir.join(format!("{stem} {side} Tolerance Interval{suffix}.svg")),
        summary: dir.join(format!("{stem} {side} Tolerance Interval Summary{suffix}.csv")),
    }
}

pub fn write_outputs(
    dir: &Path,
    stem: &str,
    result: &ToleranceResult,
    options: &RenderOptions,
) -> Result<OutputPaths> {
    fs::create_dir_all(dir)
        .with_context(|| format!("cannot create result folder {}", dir.display()))?;
    let paths = output_paths(dir, stem, result);

    render::render_svg(&result.plot, &paths.plot, options)
        .with_context(|| format!("cannot write chart {}", paths.plot.display()))?;

    let file = File::create(&paths.summary)
        .with_context(|| format!("cannot create {}", paths.summary.display()))?;
    result
        .summary_table
        .write_csv(BufWriter::new(file))
        .with_context(|| format!("cannot write summary {}", paths.summary.display()))?;

    tracing::info!(
        plot = %paths.plot.display(),
        summary = %paths.summary.display(),
        "results saved"
    );
    Ok(paths)
}
