//! Renderer-agnostic description of the tolerance interval chart.
//!
//! The engine never draws. It returns everything a renderer needs: the
//! density curve, an optional histogram of the raw data, the vertical
//! markers and the axis setup. Each descriptor is owned by its caller.

use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal};

use crate::error::{Result, ToleranceError};
use crate::sample::SampleStatistics;
use crate::types::PlotLabels;

pub const Y_LABEL: &str = "Probability density";
pub const TOLERANCE_LABEL: &str = "Tolerance";
pub const SPEC_LIMITS_LABEL: &str = "Spec Limits";

/// Relative padding added on both sides of the markers for the x range.
const X_RANGE_PADDING: f64 = 0.25;
/// Summary-statistics curves span mean +/- this many standard deviations.
const SUMMARY_CURVE_SIGMAS: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    Tolerance,
    SpecLimit,
}

impl MarkerKind {
    pub fn color(&self) -> &'static str {
        match self {
            MarkerKind::Tolerance => "green",
            MarkerKind::SpecLimit => "red",
        }
    }

    pub fn legend_label(&self) -> &'static str {
        match self {
            MarkerKind::Tolerance => TOLERANCE_LABEL,
            MarkerKind::SpecLimit => SPEC_LIMITS_LABEL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// A vertical line across the plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub x: f64,
    pub kind: MarkerKind,
    pub style: LineStyle,
    /// Legend entry; only the first marker of each kind carries one
    pub label: Option<String>,
}

/// Density-normalized histogram: bar areas sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `bins + 1` ascending bin edges
    pub edges: Vec<f64>,
    pub densities: Vec<f64>,
}

impl Histogram {
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.densities)
            .map(|(edge, d)| (edge[0], edge[1], *d))
    }

    pub fn max_density(&self) -> f64 {
        self.densities.iter().cloned().fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegendPosition {
    UpperRight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotDescriptor {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Visible x interval
    pub x_range: (f64, f64),
    /// Normal pdf at the sample mean and standard deviation
    pub density: Vec<(f64, f64)>,
    pub histogram: Option<Histogram>,
    pub markers: Vec<Marker>,
    pub legend: LegendPosition,
}

impl PlotDescriptor {
    /// Highest y value drawn, for sizing the y axis.
    pub fn y_max(&self) -> f64 {
        let curve_max = self.density.iter().map(|(_, y)| *y).fold(0.0, f64::max);
        let hist_max = self.histogram.as_ref().map_or(0.0, Histogram::max_density);
        curve_max.max(hist_max)
    }

    pub fn markers_of(&self, kind: MarkerKind) -> impl Iterator<Item = &Marker> + '_ {
        self.markers.iter().filter(move |m| m.kind == kind)
    }
}

/// Inputs gathered by the interval computation for the chart.
pub(crate) struct PlotSpec<'a> {
    pub statistics: SampleStatistics,
    pub observations: Option<&'a [f64]>,
    /// Both computed bounds, which anchor the curve domain for raw samples
    pub lower: f64,
    pub upper: f64,
    /// Relative margin of the curve domain around the bounds
    pub curve_margin: f64,
    pub tolerance_markers: Vec<f64>,
    pub limit_markers: Vec<f64>,
    /// Extra values the x range must include besides the markers
    pub range_anchors: Vec<f64>,
    pub labels: &'a PlotLabels,
    pub curve_points: usize,
    pub histogram_bins: usize,
}

pub(crate) fn build(spec: PlotSpec<'_>) -> Result<PlotDescriptor> {
    let density = if spec.statistics.sd > 0.0 {
        density_curve(&spec)?
    } else {
        // Zero spread: the bounds collapse onto the mean and there is no curve.
        Vec::new()
    };

    let histogram = spec
        .observations
        .map(|values| histogram(values, spec.histogram_bins));

    let mut markers = Vec::with_capacity(spec.tolerance_markers.len() + spec.limit_markers.len());
    push_markers(&mut markers, &spec.tolerance_markers, MarkerKind::Tolerance);
    push_markers(&mut markers, &spec.limit_markers, MarkerKind::SpecLimit);

    let mut anchors = spec.range_anchors.clone();
    anchors.extend(markers.iter().map(|m| m.x));

    Ok(PlotDescriptor {
        title: spec.labels.title.clone(),
        x_label: spec.labels.x_label.clone(),
        y_label: Y_LABEL.to_string(),
        x_range: padded_range(&anchors),
        density,
        histogram,
        markers,
        legend: LegendPosition::UpperRight,
    })
}

fn density_curve(spec: &PlotSpec<'_>) -> Result<Vec<(f64, f64)>> {
    let stats = spec.statistics;
    let normal = Normal::new(stats.mean, stats.sd)
        .map_err(|e| ToleranceError::Numerical(format!("normal distribution: {e}")))?;

    let (start, end) = match spec.observations {
        Some(_) => (
            spec.lower - spec.lower.abs() * spec.curve_margin,
            spec.upper + spec.upper.abs() * spec.curve_margin,
        ),
        None => (
            stats.mean - SUMMARY_CURVE_SIGMAS * stats.sd,
            stats.mean + SUMMARY_CURVE_SIGMAS * stats.sd,
        ),
    };
    Ok(linspace(start, end, spec.curve_points)
        .into_iter()
        .map(|x| (x, normal.pdf(x)))
        .collect())
}

fn push_markers(markers: &mut Vec<Marker>, xs: &[f64], kind: MarkerKind) {
    for (i, &x) in xs.iter().enumerate() {
        markers.push(Marker {
            x,
            kind,
            style: LineStyle::Dashed,
            label: (i == 0).then(|| kind.legend_label().to_string()),
        });
    }
}

/// `points` evenly spaced values from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (points - 1) as f64;
            (0..points).map(|i| start + step * i as f64).collect()
        }
    }
}

fn padded_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let range = max - min;
    if range <= 0.0 {
        return (min - 0.5, max + 0.5);
    }
    (min - X_RANGE_PADDING * range, max + X_RANGE_PADDING * range)
}

/// Equal-width, density-normalized histogram over the data range.
///
/// The last bin is closed on the right. A constant sample gets a unit-wide
/// range centred on its value.
fn histogram(values: &[f64], bins: usize) -> Histogram {
    let bins = bins.max(1);
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
    let width = (hi - lo) / bins as f64;

    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0_usize; bins];
    for &x in values {
        let bin = ((x - lo) / width).floor() as usize;
        counts[bin.min(bins - 1)] += 1;
    }

    let total = values.len() as f64 * width;
    let densities = counts.iter().map(|&c| c as f64 / total).collect();

    Histogram { edges, densities }
}
