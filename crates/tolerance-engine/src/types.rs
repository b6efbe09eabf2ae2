use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToleranceError};
use crate::plot::PlotDescriptor;
use crate::sample::{SampleSpecification, SampleStatistics};
use crate::table::SummaryTable;

/// Which side(s) of the population the interval bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sidedness {
    /// Two-sided interval (Howe's method)
    TwoSided,
    /// Upper one-sided bound (Natrella's method)
    OneSidedUpper,
    /// Lower one-sided bound (Natrella's method)
    OneSidedLower,
}

impl Sidedness {
    /// Human-readable label, as shown to users and used in result file names.
    pub fn label(&self) -> &'static str {
        match self {
            Sidedness::TwoSided => "Two Sided",
            Sidedness::OneSidedUpper => "One Sided - Upper Limit",
            Sidedness::OneSidedLower => "One Sided - Lower Limit",
        }
    }

    pub fn is_one_sided(&self) -> bool {
        !matches!(self, Sidedness::TwoSided)
    }
}

impl fmt::Display for Sidedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sidedness {
    type Err = ToleranceError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        let compact: String = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

        if compact == "two sided" || compact == "two" || compact == "both" {
            Ok(Sidedness::TwoSided)
        } else if compact.contains("upper") {
            Ok(Sidedness::OneSidedUpper)
        } else if compact.contains("lower") {
            Ok(Sidedness::OneSidedLower)
        } else {
            Err(ToleranceError::InvalidSidedness(s.to_string()))
        }
    }
}

/// Optional specification limits to compare the interval against.
///
/// Two-sided intervals read both; an upper one-sided bound reads `upper`
/// and a lower one-sided bound reads `lower`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecificationLimits {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl SpecificationLimits {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn two_sided(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    pub fn upper(limit: f64) -> Self {
        Self {
            lower: None,
            upper: Some(limit),
        }
    }

    pub fn lower(limit: f64) -> Self {
        Self {
            lower: Some(limit),
            upper: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    /// The single limit a one-sided interval of `sidedness` is compared to.
    pub fn for_side(&self, sidedness: Sidedness) -> Option<f64> {
        match sidedness {
            Sidedness::TwoSided => None,
            Sidedness::OneSidedUpper => self.upper,
            Sidedness::OneSidedLower => self.lower,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, limit) in [("lower", self.lower), ("upper", self.upper)] {
            if let Some(v) = limit {
                if !v.is_finite() {
                    return Err(ToleranceError::Domain(format!(
                        "{name} specification limit must be finite, got {v}"
                    )));
                }
            }
        }
        if let (Some(lo), Some(hi)) = (self.lower, self.upper) {
            if lo >= hi {
                return Err(ToleranceError::Domain(format!(
                    "lower specification limit ({lo}) must be below the upper limit ({hi})"
                )));
            }
        }
        Ok(())
    }
}

/// Confidence complement, coverage proportion and sidedness of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalParameters {
    /// Confidence complement; the interval holds with confidence 1 - alpha
    pub alpha: f64,
    /// Proportion of the population the interval should cover
    pub p: f64,
    pub sidedness: Sidedness,
}

impl IntervalParameters {
    pub fn new(alpha: f64, p: f64, sidedness: Sidedness) -> Self {
        Self {
            alpha,
            p,
            sidedness,
        }
    }

    /// Both probabilities must lie strictly inside (0, 1).
    pub fn validate(&self) -> Result<()> {
        validate_probability("alpha", self.alpha)?;
        validate_probability("p", self.p)
    }
}

impl Default for IntervalParameters {
    fn default() -> Self {
        Self::new(0.05, 0.95, Sidedness::TwoSided)
    }
}

pub(crate) fn validate_probability(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(ToleranceError::Domain(format!(
            "{name} must lie strictly between 0 and 1, got {value}"
        )));
    }
    Ok(())
}

/// Axis label and title carried into the plot descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotLabels {
    pub x_label: String,
    pub title: String,
}

impl PlotLabels {
    pub fn new(x_label: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            x_label: x_label.into(),
            title: title.into(),
        }
    }
}

/// Everything needed for one computation, passed once per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceRequest {
    pub sample: SampleSpecification,
    pub parameters: IntervalParameters,
    #[serde(default)]
    pub limits: SpecificationLimits,
    #[serde(default)]
    pub labels: PlotLabels,
}

impl ToleranceRequest {
    pub fn new(sample: SampleSpecification, parameters: IntervalParameters) -> Self {
        Self {
            sample,
            parameters,
            limits: SpecificationLimits::none(),
            labels: PlotLabels::default(),
        }
    }

    pub fn with_limits(mut self, limits: SpecificationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_labels(mut self, labels: PlotLabels) -> Self {
        self.labels = labels;
        self
    }
}

/// Quantiles and the resulting tolerance factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalFactors {
    /// Standard normal quantile of the coverage: (1+p)/2 two-sided, p one-sided
    pub z: f64,
    /// Standard normal quantile at alpha (one-sided only)
    pub z_alpha: Option<f64>,
    /// Lower-tail chi-square quantile at alpha with n - 1 dof (two-sided only)
    pub chi_square: Option<f64>,
    /// Tolerance factor applied to the standard deviation
    pub k: f64,
}

/// Outcome of a tolerance interval computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceResult {
    pub sidedness: Sidedness,
    pub statistics: SampleStatistics,
    pub alpha: f64,
    pub p: f64,
    pub factors: CriticalFactors,
    /// Coverage factor implied by the specification limits; `None` when no
    /// applicable limit was supplied
    pub k_res: Option<f64>,
    /// Specification limits the result was checked against; one-sided
    /// results keep only the limit on their side
    pub limits: SpecificationLimits,
    /// Upper bound (two-sided, or upper one-sided)
    pub upper: Option<f64>,
    /// Lower bound (two-sided, or lower one-sided)
    pub lower: Option<f64>,
    pub statement: String,
    pub summary_table: SummaryTable,
    pub plot: PlotDescriptor,
}

impl ToleranceResult {
    pub fn k(&self) -> f64 {
        self.factors.k
    }

    /// The single bound of a one-sided interval.
    pub fn tolerance_limit(&self) -> Option<f64> {
        match self.sidedness {
            Sidedness::TwoSided => None,
            Sidedness::OneSidedUpper => self.upper,
            Sidedness::OneSidedLower => self.lower,
        }
    }

    /// Upper minus lower bound, for two-sided intervals.
    pub fn width(&self) -> Option<f64> {
        match (self.lower, self.upper) {
            (Some(lo), Some(hi)) => Some(hi - lo),
            _ => None,
        }
    }

    /// Whether the computed bounds sit inside the specification limits.
    /// `None` when the limits needed for the comparison are missing.
    pub fn meets_specification(&self) -> Option<bool> {
        match self.sidedness {
            Sidedness::TwoSided => match (self.limits.lower, self.limits.upper) {
                (Some(lo), Some(hi)) => Some(self.lower? >= lo && self.upper? <= hi),
                _ => None,
            },
            Sidedness::OneSidedUpper => Some(self.upper? <= self.limits.upper?),
            Sidedness::OneSidedLower => Some(self.lower? >= self.limits.lower?),
        }
    }
}
