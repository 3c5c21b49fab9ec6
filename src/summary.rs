//! Per-variable and per-component summaries of a loading matrix.
//!
//! For each variable (row):
//!
//! - **communality** h² = Σⱼ λ²ᵢⱼ, the variance shared with the factors
//! - **uniqueness** u² = 1 − h²
//! - **complexity** (Hofmann 1978) = (Σⱼ λ²ᵢⱼ)² / Σⱼ λ⁴ᵢⱼ; 1 when a variable
//!   loads on a single factor, up to the number of factors when spread
//!   evenly
//!
//! For each component (column): sum of squared loadings, its share of the
//! total variance of the variables, the cumulative share, and the share
//! among retained components only.
//!
//! Missing cells are skipped, so a masked matrix summarizes only what is
//! displayed.
//!
//! # Example
//!
//! ```
//! use u_params::loadings::LoadingMatrix;
//! use u_params::summary::summarize_loadings;
//!
//! let m = LoadingMatrix::from_rows(
//!     vec!["x".into(), "y".into()],
//!     vec!["F1".into(), "F2".into()],
//!     vec![vec![0.8, 0.0], vec![0.6, 0.6]],
//! )
//! .unwrap();
//! let s = summarize_loadings(&m);
//!
//! assert!((s.variables[0].complexity - 1.0).abs() < 1e-12);
//! assert!((s.variables[1].complexity - 2.0).abs() < 1e-12);
//! assert!((s.variables[0].uniqueness - 0.36).abs() < 1e-12);
//! ```

use crate::loadings::{LoadingInfo, LoadingMatrix};
use serde::Serialize;

/// Summary for one observed variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSummary {
    pub label: String,
    /// Index of the dominant column, `None` if the row is all missing.
    pub cluster: Option<usize>,
    pub communality: f64,
    pub uniqueness: f64,
    /// Hofmann's complexity index. `NaN` when every loading is missing or zero.
    pub complexity: f64,
}

/// Summary for one factor or component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentSummary {
    pub label: String,
    /// Σᵢ λ²ᵢⱼ (eigenvalue for unrotated PCA).
    pub ss_loadings: f64,
    /// `ss_loadings / n_variables`.
    pub variance_proportion: f64,
    /// Running sum of `variance_proportion`.
    pub cumulative_proportion: f64,
    /// `ss_loadings / Σ ss_loadings` over retained components.
    pub variance_share: f64,
}

/// Full summary of a loading matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadingSummary {
    pub variables: Vec<VariableSummary>,
    pub components: Vec<ComponentSummary>,
    pub info: LoadingInfo,
}

impl LoadingSummary {
    /// Total proportion of variable variance explained by all components.
    pub fn total_variance_proportion(&self) -> f64 {
        self.components
            .last()
            .map_or(0.0, |c| c.cumulative_proportion)
    }
}

/// Computes variable and component summaries.
pub fn summarize_loadings(matrix: &LoadingMatrix) -> LoadingSummary {
    let clusters = crate::loadings::cluster_assignment(matrix);

    let variables: Vec<VariableSummary> = matrix
        .cells()
        .iter()
        .zip(matrix.row_labels())
        .zip(clusters)
        .map(|((row, label), cluster)| {
            let squares: Vec<f64> = row.iter().flatten().map(|v| v * v).collect();
            let communality: f64 = squares.iter().sum();
            let fourth: f64 = squares.iter().map(|s| s * s).sum();
            let complexity = if fourth > 0.0 {
                communality * communality / fourth
            } else {
                f64::NAN
            };
            VariableSummary {
                label: label.clone(),
                cluster,
                communality,
                uniqueness: 1.0 - communality,
                complexity,
            }
        })
        .collect();

    let n_vars = matrix.n_rows() as f64;
    let ss: Vec<f64> = (0..matrix.n_cols())
        .map(|j| {
            matrix
                .cells()
                .iter()
                .filter_map(|row| row[j])
                .map(|v| v * v)
                .sum::<f64>()
        })
        .collect();
    let ss_total: f64 = ss.iter().sum();

    let mut cumulative = 0.0;
    let components = ss
        .iter()
        .zip(matrix.col_labels())
        .map(|(&ss_loadings, label)| {
            let variance_proportion = ss_loadings / n_vars;
            cumulative += variance_proportion;
            ComponentSummary {
                label: label.clone(),
                ss_loadings,
                variance_proportion,
                cumulative_proportion: cumulative,
                variance_share: if ss_total > 0.0 {
                    ss_loadings / ss_total
                } else {
                    0.0
                },
            }
        })
        .collect();

    LoadingSummary {
        variables,
        components,
        info: matrix.info().clone(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
