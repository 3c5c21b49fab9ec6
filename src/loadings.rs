//! Loading matrices produced by PCA or exploratory factor analysis.
//!
//! A [`LoadingMatrix`] has one row per observed variable and one column
//! per latent factor or component. Cells are `Option<f64>`: `None` marks
//! a missing loading (never compared, never selected as a maximum).
//!
//! # Example
//!
//! ```
//! use u_params::loadings::{cluster_assignment, LoadingMatrix};
//!
//! let m = LoadingMatrix::from_rows(
//!     vec!["anx1".into(), "dep1".into()],
//!     vec!["F1".into(), "F2".into()],
//!     vec![vec![0.81, 0.12], vec![-0.20, -0.74]],
//! )
//! .unwrap();
//!
//! assert_eq!(m.n_rows(), 2);
//! assert_eq!(cluster_assignment(&m), vec![Some(0), Some(1)]);
//! ```

use crate::error::ParamsError;
use serde::Serialize;
use std::collections::HashSet;

// ── Metadata ──────────────────────────────────────────────────────────

/// Attribution carried alongside a matrix for report writers.
///
/// None of the organizer or summary algorithms read these fields; they
/// only travel with the matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadingInfo {
    /// Extraction method, e.g. `"pca"`, `"minres"`, `"ml"`.
    pub method: Option<String>,
    /// Rotation name, e.g. `"varimax"`, `"oblimin"`.
    pub rotation: Option<String>,
    /// Variance explained per column as reported by the fitting routine.
    pub explained_variance: Option<Vec<f64>>,
}

impl LoadingInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn rotation(mut self, rotation: impl Into<String>) -> Self {
        self.rotation = Some(rotation.into());
        self
    }

    pub fn explained_variance(mut self, variance: Vec<f64>) -> Self {
        self.explained_variance = Some(variance);
        self
    }
}

// ── LoadingMatrix ─────────────────────────────────────────────────────

/// Variables × factors matrix of loadings with row and column labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadingMatrix {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
    info: LoadingInfo,
}

impl LoadingMatrix {
    /// Builds a matrix from row-major optional cells.
    ///
    /// Fails if the matrix is empty, the shape disagrees with the labels,
    /// labels repeat, or a present cell is not finite.
    pub fn new(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        cells: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, ParamsError> {
        if row_labels.is_empty() || col_labels.is_empty() {
            return Err(ParamsError::invalid(
                "matrix",
                format!(
                    "needs at least one row and one column, got {}x{}",
                    row_labels.len(),
                    col_labels.len()
                ),
            ));
        }
        if cells.len() != row_labels.len() {
            return Err(ParamsError::DimensionMismatch {
                expected: row_labels.len(),
                actual: cells.len(),
            });
        }
        for row in &cells {
            if row.len() != col_labels.len() {
                return Err(ParamsError::DimensionMismatch {
                    expected: col_labels.len(),
                    actual: row.len(),
                });
            }
        }
        check_unique("row_labels", &row_labels)?;
        check_unique("col_labels", &col_labels)?;

        for (i, row) in cells.iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                if let Some(v) = cell {
                    if !v.is_finite() {
                        return Err(ParamsError::invalid(
                            "cells",
                            format!(
                                "loading ({}, {}) is not finite: {v}",
                                row_labels[i], col_labels[j]
                            ),
                        ));
                    }
                }
            }
        }

        Ok(Self {
            row_labels,
            col_labels,
            cells,
            info: LoadingInfo::default(),
        })
    }

    /// Builds a matrix from dense row-major values. `NaN` becomes missing.
    pub fn from_rows(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, ParamsError> {
        let cells = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|v| if v.is_nan() { None } else { Some(v) })
                    .collect()
            })
            .collect();
        Self::new(row_labels, col_labels, cells)
    }

    /// Builds a matrix from component-major loadings (one vector per
    /// component, each of length = number of variables), the layout PCA
    /// routines return.
    ///
    /// ```
    /// use u_params::loadings::LoadingMatrix;
    ///
    /// let m = LoadingMatrix::from_components(
    ///     vec!["x".into(), "y".into(), "z".into()],
    ///     vec!["PC1".into(), "PC2".into()],
    ///     vec![vec![0.7, 0.7, 0.1], vec![0.1, -0.1, 0.99]],
    /// )
    /// .unwrap();
    /// assert_eq!(m.n_rows(), 3);
    /// assert_eq!(m.get(2, 1), Some(0.99));
    /// ```
    pub fn from_components(
        variable_labels: Vec<String>,
        component_labels: Vec<String>,
        components: Vec<Vec<f64>>,
    ) -> Result<Self, ParamsError> {
        if components.len() != component_labels.len() {
            return Err(ParamsError::DimensionMismatch {
                expected: component_labels.len(),
                actual: components.len(),
            });
        }
        let n_vars = variable_labels.len();
        if let Some(bad) = components.iter().find(|c| c.len() != n_vars) {
            return Err(ParamsError::DimensionMismatch {
                expected: n_vars,
                actual: bad.len(),
            });
        }
        let rows = (0..n_vars)
            .map(|i| components.iter().map(|c| c[i]).collect())
            .collect();
        Self::from_rows(variable_labels, component_labels, rows)
    }

    /// Attaches pass-through metadata.
    pub fn with_info(mut self, info: LoadingInfo) -> Self {
        self.info = info;
        self
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.col_labels.len()
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    pub fn info(&self) -> &LoadingInfo {
        &self.info
    }

    /// Loading at (row, col); `None` if missing or out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// Cells of one row.
    pub fn row(&self, row: usize) -> Option<&[Option<f64>]> {
        self.cells.get(row).map(Vec::as_slice)
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, col: usize) -> Option<Vec<Option<f64>>> {
        if col >= self.n_cols() {
            return None;
        }
        Some(self.cells.iter().map(|r| r[col]).collect())
    }

    /// Number of non-missing cells.
    pub fn present_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub(crate) fn cells(&self) -> &[Vec<Option<f64>>] {
        &self.cells
    }

    /// Same labels and info, rows taken in `order`.
    pub(crate) fn permuted(&self, order: &[usize]) -> Self {
        debug_assert_eq!(order.len(), self.n_rows());
        Self {
            row_labels: order.iter().map(|&i| self.row_labels[i].clone()).collect(),
            col_labels: self.col_labels.clone(),
            cells: order.iter().map(|&i| self.cells[i].clone()).collect(),
            info: self.info.clone(),
        }
    }

    /// Same shape, labels and info with new cells.
    pub(crate) fn with_cells(&self, cells: Vec<Vec<Option<f64>>>) -> Self {
        debug_assert_eq!(cells.len(), self.n_rows());
        Self {
            row_labels: self.row_labels.clone(),
            col_labels: self.col_labels.clone(),
            cells,
            info: self.info.clone(),
        }
    }
}

fn check_unique(name: &str, labels: &[String]) -> Result<(), ParamsError> {
    let mut seen = HashSet::with_capacity(labels.len());
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(ParamsError::invalid(
                name,
                format!("duplicate label '{label}'"),
            ));
        }
    }
    Ok(())
}

// ── Cluster assignment ────────────────────────────────────────────────

/// Index of the largest absolute present value; ties keep the earliest.
pub(crate) fn argmax_abs(values: &[Option<f64>]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (j, v) in values.iter().enumerate() {
        if let Some(v) = v {
            let a = v.abs();
            match best {
                Some((_, b)) if a <= b => {}
                _ => best = Some((j, a)),
            }
        }
    }
    best.map(|(j, _)| j)
}

/// Dominant column per row: the column with the maximum absolute loading.
///
/// Ties resolve to the lower column index. A row with every cell missing
/// has no cluster (`None`).
pub fn cluster_assignment(matrix: &LoadingMatrix) -> Vec<Option<usize>> {
    matrix.cells.iter().map(|row| argmax_abs(row)).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────
