//! Distribution description for numeric samples.
//!
//! Reports centrality, dispersion, range and shape of a sample in one
//! struct. Missing values (`NaN`) are counted and excluded. Statistics
//! come from `u_numflow::stats`; a statistic that is undefined for the
//! sample (e.g. standard deviation of one value) is `NaN`.
//!
//! # Example
//!
//! ```
//! use u_params::distribution::{describe_distribution, DescribeConfig};
//!
//! let data = [2.0, 4.0, f64::NAN, 4.0, 5.0, 5.0, 7.0, 9.0, 4.0];
//! let d = describe_distribution(&data, &DescribeConfig::default()).unwrap();
//!
//! assert_eq!(d.n_obs, 8);
//! assert_eq!(d.n_missing, 1);
//! assert!((d.mean - 5.0).abs() < 1e-12);
//! assert_eq!(d.range, 7.0);
//! ```

use crate::dataframe::DataFrame;
use crate::error::ParamsError;
use serde::Serialize;

/// Scale factor making the MAD a consistent estimator of σ under
/// normality.
pub const MAD_NORMAL_CONSTANT: f64 = 1.4826;

/// Configuration for [`describe_distribution`].
#[derive(Debug, Clone, PartialEq)]
pub struct DescribeConfig {
    /// Multiplier applied to the median absolute deviation.
    /// Default: [`MAD_NORMAL_CONSTANT`]. Use 1.0 for the raw MAD.
    pub mad_constant: f64,
}

impl Default for DescribeConfig {
    fn default() -> Self {
        Self {
            mad_constant: MAD_NORMAL_CONSTANT,
        }
    }
}

impl DescribeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mad_constant(mut self, constant: f64) -> Self {
        self.mad_constant = constant;
        self
    }
}

/// Description of a numeric sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSummary {
    /// Number of present values.
    pub n_obs: usize,
    /// Number of missing values.
    pub n_missing: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation.
    pub sd: f64,
    /// Scaled median absolute deviation.
    pub mad: f64,
    /// Interquartile range (Q3 − Q1).
    pub iqr: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub skewness: f64,
    /// Excess kurtosis.
    pub kurtosis: f64,
}

/// Describes a sample; `NaN` entries are treated as missing.
///
/// Fails with [`ParamsError::InsufficientData`] when no value is present
/// and [`ParamsError::InvalidArgument`] for a negative or non-finite MAD
/// constant.
pub fn describe_distribution(
    data: &[f64],
    config: &DescribeConfig,
) -> Result<DistributionSummary, ParamsError> {
    if !config.mad_constant.is_finite() || config.mad_constant < 0.0 {
        return Err(ParamsError::invalid(
            "mad_constant",
            format!("must be a non-negative finite number, got {}", config.mad_constant),
        ));
    }

    let valid: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    let n_missing = data.len() - valid.len();
    if valid.is_empty() {
        return Err(ParamsError::InsufficientData {
            min_required: 1,
            actual: 0,
        });
    }

    let stat = |v: Option<f64>| v.unwrap_or(f64::NAN);
    let mean = stat(u_numflow::stats::mean(&valid));
    let median = stat(u_numflow::stats::median(&valid));
    let sd = stat(u_numflow::stats::std_dev(&valid));
    let min = stat(u_numflow::stats::min(&valid));
    let max = stat(u_numflow::stats::max(&valid));
    let q1 = stat(u_numflow::stats::quantile(&valid, 0.25));
    let q3 = stat(u_numflow::stats::quantile(&valid, 0.75));
    let skewness = stat(u_numflow::stats::skewness(&valid));
    let kurtosis = stat(u_numflow::stats::kurtosis(&valid));

    let abs_devs: Vec<f64> = valid.iter().map(|v| (v - median).abs()).collect();
    let mad = stat(u_numflow::stats::median(&abs_devs)) * config.mad_constant;

    tracing::debug!(n_obs = valid.len(), n_missing, "described distribution");

    Ok(DistributionSummary {
        n_obs: valid.len(),
        n_missing,
        mean,
        median,
        sd,
        mad,
        iqr: q3 - q1,
        min,
        max,
        range: max - min,
        skewness,
        kurtosis,
    })
}

/// Describes a numeric column of a table. Missing rows count toward
/// `n_missing`.
pub fn describe_column(
    df: &DataFrame,
    name: &str,
    config: &DescribeConfig,
) -> Result<DistributionSummary, ParamsError> {
    let col = df
        .column_by_name(name)
        .ok_or_else(|| ParamsError::ColumnNotFound {
            name: name.to_string(),
        })?;
    let values = col
        .to_numeric_options()
        .ok_or_else(|| ParamsError::NonNumericColumn {
            column: name.to_string(),
        })?;
    let data: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
    describe_distribution(&data, config)
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::Column;
    use approx::assert_abs_diff_eq;

    #[test]
    fn symmetric_sample() {
        let d = describe_distribution(&[1.0, 2.0, 3.0, 4.0, 5.0], &DescribeConfig::default())
            .unwrap();
        assert_eq!(d.n_obs, 5);
        assert_eq!(d.n_missing, 0);
        assert_abs_diff_eq!(d.mean, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d.median, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d.sd, 2.5f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(d.skewness, 0.0, epsilon = 1e-12);
        assert_eq!(d.min, 1.0);
        assert_eq!(d.max, 5.0);
        assert_eq!(d.range, 4.0);
        assert!(d.iqr > 0.0 && d.iqr <= d.range);
    }

    #[test]
    fn mad_scaled_and_raw() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let scaled = describe_distribution(&data, &DescribeConfig::default()).unwrap();
        assert_abs_diff_eq!(scaled.mad, MAD_NORMAL_CONSTANT, epsilon = 1e-12);

        let raw = describe_distribution(&data, &DescribeConfig::new().mad_constant(1.0)).unwrap();
        assert_abs_diff_eq!(raw.mad, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn right_skewed_sample() {
        let d = describe_distribution(
            &[1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 10.0],
            &DescribeConfig::default(),
        )
        .unwrap();
        assert!(d.skewness > 0.0);
        assert!(d.mean > d.median);
    }

    #[test]
    fn missing_values_counted() {
        let d = describe_distribution(&[f64::NAN, 4.0, f64::NAN, 6.0], &DescribeConfig::default())
            .unwrap();
        assert_eq!(d.n_obs, 2);
        assert_eq!(d.n_missing, 2);
        assert_abs_diff_eq!(d.mean, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn all_missing_rejected() {
        let err = describe_distribution(&[f64::NAN, f64::NAN], &DescribeConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            ParamsError::InsufficientData {
                min_required: 1,
                actual: 0
            }
        );
        assert!(describe_distribution(&[], &DescribeConfig::default()).is_err());
    }

    #[test]
    fn invalid_mad_constant_rejected() {
        let config = DescribeConfig::new().mad_constant(-1.0);
        assert!(describe_distribution(&[1.0, 2.0], &config).is_err());
    }

    #[test]
    fn single_value() {
        let d = describe_distribution(&[3.5], &DescribeConfig::default()).unwrap();
        assert_eq!(d.n_obs, 1);
        assert_abs_diff_eq!(d.mean, 3.5, epsilon = 1e-12);
        assert_eq!(d.range, 0.0);
        assert_eq!(d.mad, 0.0);
    }

    // ── Table columns ─────────────────────────────────────────────

    #[test]
    fn describe_numeric_column() {
        let mut df = DataFrame::new();
        df.add_column(
            "x",
            Column::from_numeric(vec![Some(2.0), None, Some(4.0)]),
        )
        .unwrap();
        let d = describe_column(&df, "x", &DescribeConfig::default()).unwrap();
        assert_eq!(d.n_obs, 2);
        assert_eq!(d.n_missing, 1);
        assert_abs_diff_eq!(d.mean, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn describe_column_errors() {
        let mut df = DataFrame::new();
        df.add_column("s", Column::from_text(&[Some("a")])).unwrap();
        assert_eq!(
            describe_column(&df, "s", &DescribeConfig::default()).unwrap_err(),
            ParamsError::NonNumericColumn { column: "s".into() }
        );
        assert_eq!(
            describe_column(&df, "t", &DescribeConfig::default()).unwrap_err(),
            ParamsError::ColumnNotFound { name: "t".into() }
        );
    }
}
