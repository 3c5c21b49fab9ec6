//! Panel-data demeaning (within/between decomposition).
//!
//! For each selected column `c` and a grouping column `g`, [`demean`]
//! derives:
//!
//! - `c_GM` — the mean of `c` within the row's group (between effect)
//! - `c_DM` — `c` minus its group mean (within effect)
//!
//! Processing tolerates partial input: selected columns that do not exist
//! are skipped, and non-numeric selected columns are recoded to zero-based
//! integers. Both are reported as [`Diagnostic`]s and logged, never as
//! errors.
//!
//! # Example
//!
//! ```
//! use u_params::dataframe::{Column, DataFrame};
//! use u_params::demean::{demean, DemeanConfig};
//!
//! let mut df = DataFrame::new();
//! df.add_column("id", Column::from_numeric(vec![Some(1.0), Some(1.0), Some(2.0), Some(2.0)]))
//!     .unwrap();
//! df.add_column("x", Column::from_numeric(vec![Some(10.0), Some(20.0), Some(30.0), Some(50.0)]))
//!     .unwrap();
//!
//! let result = demean(&df, &["x"], "id", &DemeanConfig::default()).unwrap();
//! let gm = result.table.column_by_name("x_GM").unwrap();
//! let dm = result.table.column_by_name("x_DM").unwrap();
//! assert_eq!(gm.valid_numeric_values().unwrap(), vec![15.0, 15.0, 40.0, 40.0]);
//! assert_eq!(dm.valid_numeric_values().unwrap(), vec![-5.0, 5.0, -10.0, 10.0]);
//! assert!(result.diagnostics.is_empty());
//! ```

use crate::dataframe::{Column, DataFrame};
use crate::error::{Diagnostic, ParamsError};
use std::collections::{BTreeSet, HashMap, HashSet};

// ── Configuration ─────────────────────────────────────────────────────

/// Output naming for [`demean`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemeanConfig {
    /// Suffix for group-mean columns. Default: `"_GM"`.
    pub suffix_groupmean: String,
    /// Suffix for demeaned columns. Default: `"_DM"`.
    pub suffix_demean: String,
}

impl Default for DemeanConfig {
    fn default() -> Self {
        Self {
            suffix_groupmean: "_GM".into(),
            suffix_demean: "_DM".into(),
        }
    }
}

impl DemeanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suffix_groupmean(mut self, suffix: impl Into<String>) -> Self {
        self.suffix_groupmean = suffix.into();
        self
    }

    pub fn suffix_demean(mut self, suffix: impl Into<String>) -> Self {
        self.suffix_demean = suffix.into();
        self
    }
}

// ── Result ────────────────────────────────────────────────────────────

/// Output of [`demean`].
#[derive(Debug, Clone)]
pub struct DemeanResult {
    /// All group-mean columns, then all demeaned columns, each in the
    /// order the source columns were selected. Empty when no selected
    /// column could be used.
    pub table: DataFrame,
    /// Non-fatal conditions met while processing.
    pub diagnostics: Vec<Diagnostic>,
}

// ── Demeaning ─────────────────────────────────────────────────────────

/// Computes group means and within-group deviations of `selected`
/// columns, grouped by `group`.
///
/// Missing values are excluded from a group's mean. A row whose own value
/// is missing still receives its group's mean, and a missing demeaned
/// value. Rows with a missing group key get missing outputs. A selected
/// name listed twice is processed once. A column whose output name is
/// already produced for an earlier column is skipped with
/// [`Diagnostic::OutputNameCollision`].
///
/// Fails when the `group` column is absent or both suffixes are equal.
pub fn demean(
    df: &DataFrame,
    selected: &[&str],
    group: &str,
    config: &DemeanConfig,
) -> Result<DemeanResult, ParamsError> {
    if config.suffix_groupmean == config.suffix_demean {
        return Err(ParamsError::invalid(
            "suffix_demean",
            format!("must differ from the group-mean suffix '{}'", config.suffix_groupmean),
        ));
    }
    let group_col = df.column_by_name(group).ok_or_else(|| ParamsError::ColumnNotFound {
        name: group.to_string(),
    })?;
    let (group_ids, n_groups) = group_index(group_col);
    tracing::debug!(
        rows = df.row_count(),
        groups = n_groups,
        selected = selected.len(),
        "demeaning"
    );

    let mut diagnostics = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    let mut outputs: HashSet<String> = HashSet::new();
    let mut means: Vec<(String, Vec<Option<f64>>)> = Vec::new();
    let mut deviations: Vec<(String, Vec<Option<f64>>)> = Vec::new();

    for &name in selected {
        if seen.contains(&name) {
            continue;
        }
        seen.push(name);

        let Some(col) = df.column_by_name(name) else {
            report(&mut diagnostics, Diagnostic::ColumnNotFound { name: name.to_string() });
            continue;
        };
        let gm_name = format!("{name}{}", config.suffix_groupmean);
        let dm_name = format!("{name}{}", config.suffix_demean);
        if let Some(taken) = [&gm_name, &dm_name].into_iter().find(|n| outputs.contains(*n)) {
            report(
                &mut diagnostics,
                Diagnostic::OutputNameCollision {
                    column: name.to_string(),
                    name: taken.clone(),
                },
            );
            continue;
        }
        outputs.insert(gm_name.clone());
        outputs.insert(dm_name.clone());

        let (values, recoded_levels) = as_numeric(col);
        if let Some(levels) = recoded_levels {
            report(
                &mut diagnostics,
                Diagnostic::CategoricalRecoded {
                    column: name.to_string(),
                    levels,
                },
            );
        }

        let gm = group_means(&values, &group_ids, n_groups);
        let dm = values
            .iter()
            .zip(&gm)
            .map(|(v, m)| match (v, m) {
                (Some(v), Some(m)) => Some(v - m),
                _ => None,
            })
            .collect();
        means.push((gm_name, gm));
        deviations.push((dm_name, dm));
    }

    let mut table = DataFrame::new();
    for (name, values) in means.into_iter().chain(deviations) {
        table.add_column(name, Column::from_numeric(values))?;
    }

    Ok(DemeanResult { table, diagnostics })
}

fn report(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    tracing::warn!("{diagnostic}");
    diagnostics.push(diagnostic);
}

/// Dense group id per row (first-appearance order) and the group count.
fn group_index(col: &Column) -> (Vec<Option<usize>>, usize) {
    let mut ids: HashMap<String, usize> = HashMap::new();
    let rows = (0..col.len())
        .map(|i| {
            col.key_at(i).map(|key| {
                let next = ids.len();
                *ids.entry(key).or_insert(next)
            })
        })
        .collect();
    (rows, ids.len())
}

/// Numeric view of a column. Non-numeric columns are recoded to
/// zero-based integers; the second element is the number of levels in
/// that case.
fn as_numeric(col: &Column) -> (Vec<Option<f64>>, Option<usize>) {
    match col {
        Column::Numeric { .. } => (col.to_numeric_options().unwrap_or_default(), None),
        Column::Boolean { values, validity } => {
            let coded = (0..col.len())
                .map(|i| validity.is_valid(i).then(|| if values[i] { 1.0 } else { 0.0 }))
                .collect();
            (coded, Some(2))
        }
        Column::Categorical {
            dictionary,
            indices,
            validity,
        } => {
            let coded = (0..col.len())
                .map(|i| validity.is_valid(i).then(|| indices[i] as f64))
                .collect();
            (coded, Some(dictionary.len()))
        }
        Column::Text { values, validity } => {
            let levels: BTreeSet<&str> = validity
                .valid_indices()
                .map(|i| values[i].as_str())
                .collect();
            let lookup: HashMap<&str, usize> =
                levels.iter().enumerate().map(|(code, &s)| (s, code)).collect();
            let coded = (0..col.len())
                .map(|i| {
                    validity
                        .is_valid(i)
                        .then(|| lookup[values[i].as_str()] as f64)
                })
                .collect();
            (coded, Some(levels.len()))
        }
    }
}

/// Per-row group mean over present values.
fn group_means(
    values: &[Option<f64>],
    group_ids: &[Option<usize>],
    n_groups: usize,
) -> Vec<Option<f64>> {
    let mut sums = vec![0.0; n_groups];
    let mut counts = vec![0usize; n_groups];
    for (v, g) in values.iter().zip(group_ids) {
        if let (Some(v), Some(g)) = (v, g) {
            sums[*g] += v;
            counts[*g] += 1;
        }
    }
    group_ids
        .iter()
        .map(|g| g.and_then(|g| (counts[g] > 0).then(|| sums[g] / counts[g] as f64)))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────
