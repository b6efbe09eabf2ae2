use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::{Result, ToleranceError};

/// The sample a tolerance interval is built from.
///
/// Either the raw observations, or the summary triple a user already has
/// from elsewhere. Raw observations keep their order; only the histogram of
/// the plot descriptor depends on them beyond mean/sd/n.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SampleSpecification {
    Raw(Vec<f64>),
    Summary { mean: f64, sd: f64, n: usize },
}

impl SampleSpecification {
    pub fn raw(values: impl Into<Vec<f64>>) -> Self {
        SampleSpecification::Raw(values.into())
    }

    pub fn summary(mean: f64, sd: f64, n: usize) -> Self {
        SampleSpecification::Summary { mean, sd, n }
    }

    /// Raw observations, if the sample was given as data.
    pub fn observations(&self) -> Option<&[f64]> {
        match self {
            SampleSpecification::Raw(values) => Some(values),
            SampleSpecification::Summary { .. } => None,
        }
    }

    /// Derive (and validate) mean, standard deviation and sample size.
    pub fn statistics(&self) -> Result<SampleStatistics> {
        match self {
            SampleSpecification::Raw(values) => SampleStatistics::from_observations(values),
            SampleSpecification::Summary { mean, sd, n } => SampleStatistics::new(*mean, *sd, *n),
        }
    }
}

/// Mean, sample standard deviation (n - 1 denominator) and size of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleStatistics {
    pub mean: f64,
    pub sd: f64,
    pub n: usize,
}

impl SampleStatistics {
    pub fn new(mean: f64, sd: f64, n: usize) -> Result<Self> {
        if !mean.is_finite() {
            return Err(ToleranceError::Domain(format!(
                "mean must be a finite number, got {mean}"
            )));
        }
        if !sd.is_finite() || sd < 0.0 {
            return Err(ToleranceError::Domain(format!(
                "standard deviation must be finite and >= 0, got {sd}"
            )));
        }
        if n < 2 {
            return Err(ToleranceError::Domain(format!(
                "sample size must be at least 2 (degrees of freedom >= 1), got {n}"
            )));
        }

        Ok(Self { mean, sd, n })
    }

    pub fn from_observations(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(ToleranceError::InputFormat(
                "sample contains no observations".to_string(),
            ));
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(ToleranceError::InputFormat(format!(
                "observation {} is not a finite number ({})",
                idx + 1,
                values[idx]
            )));
        }
        if values.len() < 2 {
            return Err(ToleranceError::Domain(format!(
                "sample size must be at least 2 (degrees of freedom >= 1), got {}",
                values.len()
            )));
        }

        Self::new(values.mean(), values.std_dev(), values.len())
    }

    /// Degrees of freedom, n - 1.
    pub fn dof(&self) -> usize {
        self.n - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_statistics_from_observations() {
        let data = [9.5, 10.0, 10.2, 9.8, 10.1, 10.3, 9.9, 10.0];
        let stats = SampleStatistics::from_observations(&data).unwrap();

        assert_eq!(stats.n, 8);
        assert_eq!(stats.dof(), 7);
        assert_relative_eq!(stats.mean, 9.975, epsilon = 1e-12);

        // Sample variance with n - 1 denominator
        let var: f64 = data.iter().map(|x| (x - 9.975_f64).powi(2)).sum::<f64>() / 7.0;
        assert_relative_eq!(stats.sd, var.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_sample_is_input_format_error() {
        let err = SampleSpecification::raw(Vec::new()).statistics().unwrap_err();
        assert!(matches!(err, ToleranceError::InputFormat(_)));
    }

    #[test]
    fn test_non_finite_observation_rejected() {
        let err = SampleStatistics::from_observations(&[1.0, f64::NAN, 3.0]).unwrap_err();
        assert!(matches!(err, ToleranceError::InputFormat(ref msg) if msg.contains("observation 2")));
    }

    #[test]
    fn test_single_observation_is_domain_error() {
        let err = SampleSpecification::raw(vec![4.2]).statistics().unwrap_err();
        assert!(matches!(err, ToleranceError::Domain(_)));
    }

    #[test]
    fn test_summary_validation() {
        assert!(SampleSpecification::summary(0.0, 1.0, 2).statistics().is_ok());
        // Zero spread is accepted here and only fails where sd is divided by
        assert!(SampleSpecification::summary(5.0, 0.0, 10).statistics().is_ok());

        assert!(matches!(
            SampleSpecification::summary(0.0, 1.0, 1).statistics(),
            Err(ToleranceError::Domain(_))
        ));
        assert!(matches!(
            SampleSpecification::summary(0.0, -0.5, 10).statistics(),
            Err(ToleranceError::Domain(_))
        ));
        assert!(matches!(
            SampleSpecification::summary(f64::INFINITY, 1.0, 10).statistics(),
            Err(ToleranceError::Domain(_))
        ));
    }

    #[test]
    fn test_observations_accessor() {
        let raw = SampleSpecification::raw(vec![1.0, 2.0]);
        assert_eq!(raw.observations(), Some(&[1.0, 2.0][..]));
        assert!(SampleSpecification::summary(1.0, 1.0, 5).observations().is_none());
    }
}
