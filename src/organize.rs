//! Sorting and thresholding of loading matrices for display.
//!
//! - [`sort_loadings`] groups variables by their dominant factor so the
//!   matrix reads block-diagonally, strongest loadings first in each block.
//! - [`filter_loadings`] masks small loadings as missing, by absolute
//!   cutoff, by top-k per column, or by keeping only each row's maximum.
//!
//! Both return a new matrix; the input is never modified. Row labels and
//! [`LoadingInfo`](crate::loadings::LoadingInfo) travel with the rows.
//!
//! # Example
//!
//! ```
//! use u_params::loadings::LoadingMatrix;
//! use u_params::organize::{filter_loadings, sort_loadings, Threshold};
//!
//! let m = LoadingMatrix::from_rows(
//!     vec!["a".into(), "b".into(), "c".into(), "d".into()],
//!     vec!["F1".into(), "F2".into()],
//!     vec![
//!         vec![0.80, 0.10],
//!         vec![0.20, 0.70],
//!         vec![0.75, 0.05],
//!         vec![0.10, 0.65],
//!     ],
//! )
//! .unwrap();
//!
//! let sorted = sort_loadings(&m);
//! assert_eq!(sorted.row_labels(), &["a", "c", "b", "d"]);
//!
//! let masked = filter_loadings(&sorted, Threshold::Cutoff(0.4)).unwrap();
//! assert_eq!(masked.present_count(), 4);
//! ```

use crate::error::ParamsError;
use crate::loadings::{argmax_abs, cluster_assignment, LoadingMatrix};

// ── Sort ──────────────────────────────────────────────────────────────

/// Row permutation produced by [`sort_loadings`]: original row indices in
/// output order.
///
/// Clusters appear in the order they are first met scanning rows top to
/// bottom. Within a cluster, rows are ordered by descending absolute
/// loading on the cluster's column, ties keeping original order. Rows
/// with every loading missing have no cluster and go last, in original
/// order.
pub fn sort_order(matrix: &LoadingMatrix) -> Vec<usize> {
    let clusters = cluster_assignment(matrix);

    // (column, member rows) in first-encounter order
    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    let mut unassigned = Vec::new();
    for (row, cluster) in clusters.iter().enumerate() {
        match cluster {
            Some(col) => match groups.iter_mut().find(|(c, _)| c == col) {
                Some((_, members)) => members.push(row),
                None => groups.push((*col, vec![row])),
            },
            None => unassigned.push(row),
        }
    }

    let mut order = Vec::with_capacity(matrix.n_rows());
    for (col, mut members) in groups {
        // stable: equal magnitudes keep original row order
        members.sort_by(|&a, &b| abs_at(matrix, b, col).total_cmp(&abs_at(matrix, a, col)));
        order.extend(members);
    }
    order.extend(unassigned);
    order
}

/// Reorders rows so that variables loading on the same factor are
/// adjacent and sorted by loading strength. See [`sort_order`] for the
/// exact ordering. Applying it twice gives the same result as once.
pub fn sort_loadings(matrix: &LoadingMatrix) -> LoadingMatrix {
    let order = sort_order(matrix);
    tracing::debug!(
        rows = matrix.n_rows(),
        cols = matrix.n_cols(),
        "sorted loading matrix"
    );
    matrix.permuted(&order)
}

fn abs_at(matrix: &LoadingMatrix, row: usize, col: usize) -> f64 {
    matrix.get(row, col).map_or(0.0, f64::abs)
}

// ── Threshold ─────────────────────────────────────────────────────────

/// How [`filter_loadings`] decides which cells to keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// Keep cells with `|value| >= t`, for `0 <= t < 1`.
    Cutoff(f64),
    /// Keep the `k` largest absolute values of each column. Ties at the
    /// boundary go to the earlier row.
    TopPerColumn(usize),
    /// Keep only the largest absolute value of each row. Ties go to the
    /// first column.
    MaxPerRow,
}

impl Threshold {
    /// Interprets a bare numeric threshold: values below 1 are an absolute
    /// cutoff, values of 1 or more are a per-column count (rounded).
    ///
    /// The count bound is checked after rounding, so on a 4-row matrix
    /// `3.6` becomes `TopPerColumn(4)` and is rejected by
    /// [`filter_loadings`].
    ///
    /// ```
    /// use u_params::organize::Threshold;
    ///
    /// assert_eq!(Threshold::from_value(0.3).unwrap(), Threshold::Cutoff(0.3));
    /// assert_eq!(Threshold::from_value(2.4).unwrap(), Threshold::TopPerColumn(2));
    /// assert!(Threshold::from_value(-0.1).is_err());
    /// ```
    pub fn from_value(t: f64) -> Result<Self, ParamsError> {
        if !t.is_finite() || t < 0.0 {
            return Err(ParamsError::invalid(
                "threshold",
                format!("must be a non-negative finite number, got {t}"),
            ));
        }
        if t < 1.0 {
            Ok(Self::Cutoff(t))
        } else {
            Ok(Self::TopPerColumn(t.round() as usize))
        }
    }

    fn validate(&self, n_rows: usize) -> Result<(), ParamsError> {
        match *self {
            Self::Cutoff(t) => {
                if !t.is_finite() || !(0.0..1.0).contains(&t) {
                    return Err(ParamsError::invalid(
                        "threshold",
                        format!("cutoff must be in [0, 1), got {t}"),
                    ));
                }
            }
            Self::TopPerColumn(k) => {
                if k == 0 {
                    return Err(ParamsError::invalid(
                        "threshold",
                        "per-column count must be at least 1",
                    ));
                }
                if k >= n_rows {
                    return Err(ParamsError::invalid(
                        "threshold",
                        format!("per-column count {k} must be less than the number of rows ({n_rows})"),
                    ));
                }
            }
            Self::MaxPerRow => {}
        }
        Ok(())
    }
}

// ── Filter ────────────────────────────────────────────────────────────

/// Replaces loadings that fail the threshold with missing.
///
/// The result has the same shape, labels and info as the input. Cells
/// already missing stay missing. A column with fewer than `k` present
/// cells keeps all of them under [`Threshold::TopPerColumn`].
///
/// Fails with [`ParamsError::InvalidArgument`] for a cutoff outside
/// `[0, 1)`, a count of zero, or a count not below the number of rows.
pub fn filter_loadings(
    matrix: &LoadingMatrix,
    threshold: Threshold,
) -> Result<LoadingMatrix, ParamsError> {
    threshold.validate(matrix.n_rows())?;
    tracing::debug!(
        rows = matrix.n_rows(),
        cols = matrix.n_cols(),
        ?threshold,
        "filtering loading matrix"
    );

    let cells = matrix.cells();
    let masked: Vec<Vec<Option<f64>>> = match threshold {
        Threshold::Cutoff(t) => cells
            .iter()
            .map(|row| row.iter().map(|c| c.filter(|v| v.abs() >= t)).collect())
            .collect(),
        Threshold::MaxPerRow => cells
            .iter()
            .map(|row| {
                let keep = argmax_abs(row);
                row.iter()
                    .enumerate()
                    .map(|(j, c)| if Some(j) == keep { *c } else { None })
                    .collect()
            })
            .collect(),
        Threshold::TopPerColumn(k) => {
            let mut out = vec![vec![None; matrix.n_cols()]; matrix.n_rows()];
            for col in 0..matrix.n_cols() {
                for row in top_rows(cells, col, k) {
                    out[row][col] = cells[row][col];
                }
            }
            out
        }
    };

    Ok(matrix.with_cells(masked))
}

/// Rows holding the `k` largest absolute present values of `col`.
fn top_rows(cells: &[Vec<Option<f64>>], col: usize, k: usize) -> Vec<usize> {
    let mut present: Vec<(usize, f64)> = cells
        .iter()
        .enumerate()
        .filter_map(|(i, row)| row[col].map(|v| (i, v.abs())))
        .collect();
    present.sort_by(|a, b| b.1.total_cmp(&a.1));
    present.truncate(k);
    present.into_iter().map(|(i, _)| i).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────
