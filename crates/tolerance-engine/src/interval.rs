//! Normal tolerance intervals (NIST/SEMATECH e-Handbook §7.2.6.3).
//!
//! - Two-sided: Howe (1969) approximation of the tolerance factor
//!   `k = z((1+p)/2) * sqrt((n-1)(1 + 1/n) / chi2(alpha; n-1))`.
//! - One-sided: Natrella (1963) approximation
//!   `k = (z(p) + sqrt(z(p)^2 - a*b)) / a` with
//!   `a = 1 - z(alpha)^2 / (2(n-1))` and `b = z(p)^2 - z(alpha)^2 / n`.
//!
//! The one-sided factor uses the normal quantile at `alpha` itself, not at
//! `1 - alpha`. Because `a` and `b` only use its square, the sign does not
//! matter.

use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF, Normal};

use crate::error::{Result, ToleranceError};
use crate::plot::{self, PlotSpec};
use crate::sample::SampleSpecification;
use crate::table::{SummaryTable, TableCell};
use crate::types::{
    CriticalFactors, IntervalParameters, PlotLabels, Sidedness, SpecificationLimits,
    ToleranceRequest, ToleranceResult,
};

/// Curve domain margin around the bounds for raw two-sided samples.
const TWO_SIDED_CURVE_MARGIN: f64 = 0.5;
/// Curve domain margin around the bounds for raw one-sided samples.
const ONE_SIDED_CURVE_MARGIN: f64 = 0.2;
/// Newton steps polishing the chi-square quantile.
const CHI_SQUARE_REFINE_STEPS: usize = 4;

/// Resolution of the chart descriptor produced with each result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EngineSettings {
    /// Number of points on the density curve
    pub curve_points: usize,
    /// Number of equal-width histogram bins for raw samples
    pub histogram_bins: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            curve_points: 1000,
            histogram_bins: 10,
        }
    }
}

/// Stateless tolerance interval calculator. Every call recomputes from its
/// inputs and returns an owned result.
#[derive(Debug, Clone, Default)]
pub struct ToleranceIntervalEngine {
    settings: EngineSettings,
}

impl ToleranceIntervalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the interval described by a request, dispatching on its
    /// sidedness.
    pub fn compute(&self, request: &ToleranceRequest) -> Result<ToleranceResult> {
        let params = &request.parameters;
        params.validate()?;
        match params.sidedness {
            Sidedness::TwoSided => self.two_sided(
                &request.sample,
                params.alpha,
                params.p,
                &request.limits,
                &request.labels,
            ),
            side => self.one_sided(
                &request.sample,
                params.alpha,
                params.p,
                side,
                request.limits.for_side(side),
                &request.labels,
            ),
        }
    }

    /// Two-sided interval (Howe's method).
    ///
    /// `k_res` is only computed when both specification limits are present.
    ///
    /// # Errors
    ///
    /// - [`ToleranceError::Domain`] for n < 2, sd < 0, `alpha`/`p` outside
    ///   (0, 1) or invalid limits
    /// - [`ToleranceError::Numerical`] for a degenerate chi-square quantile
    ///   or a zero standard deviation combined with specification limits
    pub fn compute_two_sided(
        &self,
        sample: &SampleSpecification,
        alpha: f64,
        p: f64,
        limits: &SpecificationLimits,
    ) -> Result<ToleranceResult> {
        self.two_sided(sample, alpha, p, limits, &PlotLabels::default())
    }

    /// One-sided interval (Natrella's method) for an upper or lower bound.
    ///
    /// # Errors
    ///
    /// - [`ToleranceError::InvalidSidedness`] if `sidedness` is two-sided
    /// - [`ToleranceError::Domain`] for invalid sample or probabilities, or
    ///   when the sample is too small for the requested confidence
    ///   (`a <= 0` or a negative discriminant)
    pub fn compute_one_sided(
        &self,
        sample: &SampleSpecification,
        alpha: f64,
        p: f64,
        sidedness: Sidedness,
        limit: Option<f64>,
    ) -> Result<ToleranceResult> {
        self.one_sided(sample, alpha, p, sidedness, limit, &PlotLabels::default())
    }

    fn two_sided(
        &self,
        sample: &SampleSpecification,
        alpha: f64,
        p: f64,
        limits: &SpecificationLimits,
        labels: &PlotLabels,
    ) -> Result<ToleranceResult> {
        IntervalParameters::new(alpha, p, Sidedness::TwoSided).validate()?;
        limits.validate()?;
        let stats = sample.statistics()?;

        let n = stats.n as f64;
        let dof = stats.dof() as f64;

        let z = normal_quantile((1.0 + p) / 2.0)?;
        let chi = chi_square_quantile(alpha, dof)?;
        if !chi.is_finite() || chi <= 0.0 {
            return Err(ToleranceError::Numerical(format!(
                "chi-square quantile at {alpha} with {dof} degrees of freedom is degenerate ({chi})"
            )));
        }

        let k = z * (dof * (1.0 + 1.0 / n) / chi).sqrt();
        let upper = stats.mean + stats.sd * k;
        let lower = stats.mean - stats.sd * k;

        let k_res = match (limits.lower, limits.upper) {
            (Some(lo), Some(hi)) => Some(coverage_factor(hi - lo, stats.sd)?),
            _ => None,
        };

        tracing::debug!(n = stats.n, dof, z, chi, k, ?k_res, "two-sided tolerance factor");

        let statement = format!(
            "With {}% confidence, {}% of the population will fall within [{} , {}]",
            format_percent(1.0 - alpha),
            format_percent(p),
            format_rounded(lower),
            format_rounded(upper),
        );

        let summary_table = SummaryTable::from_pairs(vec![
            ("mean", TableCell::Real(stats.mean)),
            ("sd", TableCell::Real(stats.sd)),
            ("sample size", TableCell::Count(stats.n)),
            ("alpha", TableCell::Real(alpha)),
            ("p", TableCell::Real(p)),
            ("Z", TableCell::Real(z)),
            ("Chi^2", TableCell::Real(chi)),
            ("kcrit", TableCell::Real(k)),
            ("k_res", TableCell::from(k_res)),
            ("UL", TableCell::Real(upper)),
            ("LL", TableCell::Real(lower)),
        ]);

        let limit_markers: Vec<f64> = [limits.lower, limits.upper].into_iter().flatten().collect();
        let plot = plot::build(PlotSpec {
            statistics: stats,
            observations: sample.observations(),
            lower,
            upper,
            curve_margin: TWO_SIDED_CURVE_MARGIN,
            tolerance_markers: vec![lower, upper],
            limit_markers,
            range_anchors: vec![lower, upper],
            labels,
            curve_points: self.settings.curve_points,
            histogram_bins: self.settings.histogram_bins,
        })?;

        Ok(ToleranceResult {
            sidedness: Sidedness::TwoSided,
            statistics: stats,
            alpha,
            p,
            factors: CriticalFactors {
                z,
                z_alpha: None,
                chi_square: Some(chi),
                k,
            },
            k_res,
            limits: *limits,
            upper: Some(upper),
            lower: Some(lower),
            statement,
            summary_table,
            plot,
        })
    }

    fn one_sided(
        &self,
        sample: &SampleSpecification,
        alpha: f64,
        p: f64,
        sidedness: Sidedness,
        limit: Option<f64>,
        labels: &PlotLabels,
    ) -> Result<ToleranceResult> {
        if !sidedness.is_one_sided() {
            return Err(ToleranceError::InvalidSidedness(sidedness.label().to_string()));
        }
        IntervalParameters::new(alpha, p, sidedness).validate()?;
        if let Some(l) = limit {
            if !l.is_finite() {
                return Err(ToleranceError::Domain(format!(
                    "specification limit must be finite, got {l}"
                )));
            }
        }
        let stats = sample.statistics()?;

        let n = stats.n as f64;
        let dof = stats.dof() as f64;

        let z = normal_quantile(p)?;
        let z_alpha = normal_quantile(alpha)?;

        let a = 1.0 - z_alpha.powi(2) / (2.0 * dof);
        if a <= 0.0 {
            return Err(ToleranceError::Domain(format!(
                "sample size {} is too small for alpha = {alpha} (a = {a} <= 0)",
                stats.n
            )));
        }
        let b = z.powi(2) - z_alpha.powi(2) / n;
        let discriminant = z.powi(2) - a * b;
        if discriminant < 0.0 {
            return Err(ToleranceError::Domain(format!(
                "negative discriminant {discriminant} in the one-sided tolerance factor"
            )));
        }

        let k = (z + discriminant.sqrt()) / a;
        let upper = stats.mean + stats.sd * k;
        let lower = stats.mean - stats.sd * k;

        let (tol, k_res) = match sidedness {
            Sidedness::OneSidedUpper => (
                upper,
                limit.map(|l| coverage_factor(l - stats.mean, stats.sd)).transpose()?,
            ),
            _ => (
                lower,
                limit.map(|l| coverage_factor(stats.mean - l, stats.sd)).transpose()?,
            ),
        };

        tracing::debug!(n = stats.n, z, z_alpha, a, b, k, ?k_res, side = %sidedness, "one-sided tolerance factor");

        let bound_phrase = match sidedness {
            Sidedness::OneSidedUpper => "will not exceed",
            _ => "will not fall below",
        };
        let statement = format!(
            "With {}% confidence, {}% of the population {} {}",
            format_percent(1.0 - alpha),
            format_percent(p),
            bound_phrase,
            format_rounded(tol),
        );

        let bound_column = match sidedness {
            Sidedness::OneSidedUpper => "UL",
            _ => "LL",
        };
        let summary_table = SummaryTable::from_pairs(vec![
            ("mean", TableCell::Real(stats.mean)),
            ("sd", TableCell::Real(stats.sd)),
            ("sample size", TableCell::Count(stats.n)),
            ("alpha", TableCell::Real(alpha)),
            ("p", TableCell::Real(p)),
            ("Z", TableCell::Real(z)),
            ("k-crit", TableCell::Real(k)),
            ("k_res", TableCell::from(k_res)),
            (bound_column, TableCell::Real(tol)),
        ]);

        let plot = plot::build(PlotSpec {
            statistics: stats,
            observations: sample.observations(),
            lower,
            upper,
            curve_margin: ONE_SIDED_CURVE_MARGIN,
            tolerance_markers: vec![tol],
            limit_markers: limit.into_iter().collect(),
            range_anchors: vec![lower, upper],
            labels,
            curve_points: self.settings.curve_points,
            histogram_bins: self.settings.histogram_bins,
        })?;

        let (upper, lower, limits) = match sidedness {
            Sidedness::OneSidedUpper => (
                Some(upper),
                None,
                SpecificationLimits {
                    lower: None,
                    upper: limit,
                },
            ),
            _ => (
                None,
                Some(lower),
                SpecificationLimits {
                    lower: limit,
                    upper: None,
                },
            ),
        };

        Ok(ToleranceResult {
            sidedness,
            statistics: stats,
            alpha,
            p,
            factors: CriticalFactors {
                z,
                z_alpha: Some(z_alpha),
                chi_square: None,
                k,
            },
            k_res,
            limits,
            upper,
            lower,
            statement,
            summary_table,
            plot,
        })
    }
}

// --- Helper functions ---

fn normal_quantile(prob: f64) -> Result<f64> {
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ToleranceError::Numerical(format!("standard normal: {e}")))?;
    Ok(normal.inverse_cdf(prob))
}

/// Lower-tail chi-square quantile.
fn chi_square_quantile(prob: f64, dof: f64) -> Result<f64> {
    let dist = ChiSquared::new(dof)
        .map_err(|e| ToleranceError::Numerical(format!("chi-square with {dof} dof: {e}")))?;

    let mut x = dist.inverse_cdf(prob);
    for _ in 0..CHI_SQUARE_REFINE_STEPS {
        let density = dist.pdf(x);
        if !density.is_finite() || density <= 0.0 {
            break;
        }
        let next = x - (dist.cdf(x) - prob) / density;
        if !next.is_finite() || next <= 0.0 {
            break;
        }
        x = next;
    }
    Ok(x)
}

/// Distance from the mean (or between limits) in standard deviations.
fn coverage_factor(distance: f64, sd: f64) -> Result<f64> {
    if sd == 0.0 {
        return Err(ToleranceError::Numerical(
            "standard deviation is zero; the coverage factor is undefined".to_string(),
        ));
    }
    Ok(distance / sd)
}

/// `0.95` -> `"95.0"`; float noise past ten decimals is dropped.
fn format_percent(fraction: f64) -> String {
    format_number((fraction * 100.0 * 1e10).round() / 1e10)
}

/// Rounded to two decimals, ties to even, e.g. `13.370208` -> `"13.37"`
/// and `0.125` -> `"0.12"`.
fn format_rounded(value: f64) -> String {
    format_number((value * 100.0).round_ties_even() / 100.0)
}

fn format_number(value: f64) -> String {
    // Shortest round-trip form, always with a decimal point; no "-0.0".
    format!("{:?}", value + 0.0)
}
