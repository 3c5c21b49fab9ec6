//! Column-major table used as input and output of panel operations.
//!
//! A [`DataFrame`] holds named, typed columns of equal length. Missing
//! values are tracked by a bit-packed [`ValidityBitmap`] per column, so a
//! column's dense storage never needs a sentinel.
//!
//! # Example
//!
//! ```
//! use u_params::dataframe::{Column, DataFrame};
//!
//! let mut df = DataFrame::new();
//! df.add_column("id", Column::from_numeric(vec![Some(1.0), Some(1.0), Some(2.0)]))
//!     .unwrap();
//! df.add_column("wage", Column::from_numeric(vec![Some(9.5), None, Some(12.0)]))
//!     .unwrap();
//! assert_eq!(df.row_count(), 3);
//! assert_eq!(df.column_by_name("wage").unwrap().null_count(), 1);
//! ```

use crate::error::ParamsError;

// ── ValidityBitmap ────────────────────────────────────────────────────

/// One bit per row: 1 = present, 0 = missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityBitmap {
    bits: Vec<u64>,
    len: usize,
}

impl ValidityBitmap {
    /// Bitmap with all `len` positions present.
    pub fn all_valid(len: usize) -> Self {
        let mut bm = Self::all_invalid(len);
        for i in 0..len {
            bm.set_valid(i);
        }
        bm
    }

    /// Bitmap with all `len` positions missing.
    pub fn all_invalid(len: usize) -> Self {
        Self {
            bits: vec![0u64; len.div_ceil(64)],
            len,
        }
    }

    /// Builds a bitmap from per-row presence flags.
    pub fn from_flags(flags: impl IntoIterator<Item = bool>) -> Self {
        let mut bm = Self {
            bits: Vec::new(),
            len: 0,
        };
        for flag in flags {
            bm.push(flag);
        }
        bm
    }

    /// Returns `true` if row `idx` holds a value.
    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len, "index {idx} out of bounds (len={})", self.len);
        (self.bits[idx / 64] >> (idx % 64)) & 1 == 1
    }

    /// Marks row `idx` as present.
    #[inline]
    pub fn set_valid(&mut self, idx: usize) {
        debug_assert!(idx < self.len, "index {idx} out of bounds (len={})", self.len);
        self.bits[idx / 64] |= 1u64 << (idx % 64);
    }

    /// Marks row `idx` as missing.
    #[inline]
    pub fn set_invalid(&mut self, idx: usize) {
        debug_assert!(idx < self.len, "index {idx} out of bounds (len={})", self.len);
        self.bits[idx / 64] &= !(1u64 << (idx % 64));
    }

    /// Appends one row.
    pub fn push(&mut self, valid: bool) {
        let idx = self.len;
        self.len += 1;
        if idx / 64 >= self.bits.len() {
            self.bits.push(0);
        }
        if valid {
            self.set_valid(idx);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of missing rows.
    pub fn null_count(&self) -> usize {
        let present: usize = self.bits.iter().map(|w| w.count_ones() as usize).sum();
        self.len - present
    }

    /// Indices of present rows, ascending.
    pub fn valid_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.is_valid(i))
    }
}

// ── DataType ──────────────────────────────────────────────────────────

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Numeric,
    Boolean,
    Categorical,
    Text,
}

// ── Column ────────────────────────────────────────────────────────────

/// A typed column. Missing positions hold a placeholder (0.0, false,
/// index 0, empty string) that is never read. A `NaN` in a numeric column
/// reads as missing even when its validity bit is set.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric {
        values: Vec<f64>,
        validity: ValidityBitmap,
    },
    Boolean {
        values: Vec<bool>,
        validity: ValidityBitmap,
    },
    /// Dictionary-encoded strings. `indices[i]` points into `dictionary`.
    Categorical {
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    },
    Text {
        values: Vec<String>,
        validity: ValidityBitmap,
    },
}

impl Column {
    /// Numeric column from optional values. `Some(NaN)` is stored as missing.
    pub fn from_numeric(values: Vec<Option<f64>>) -> Self {
        let values: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        let validity = ValidityBitmap::from_flags(values.iter().map(Option::is_some));
        let values = values.into_iter().map(|v| v.unwrap_or(0.0)).collect();
        Self::Numeric { values, validity }
    }

    /// Boolean column from optional values.
    pub fn from_boolean(values: Vec<Option<bool>>) -> Self {
        let validity = ValidityBitmap::from_flags(values.iter().map(Option::is_some));
        let values = values.into_iter().map(|v| v.unwrap_or(false)).collect();
        Self::Boolean { values, validity }
    }

    /// Categorical column; the dictionary is built in order of first
    /// appearance.
    pub fn from_categories<S: AsRef<str>>(values: &[Option<S>]) -> Self {
        let mut dictionary: Vec<String> = Vec::new();
        let mut indices = Vec::with_capacity(values.len());
        for v in values {
            let idx = match v {
                Some(s) => {
                    let s = s.as_ref();
                    match dictionary.iter().position(|d| d == s) {
                        Some(pos) => pos,
                        None => {
                            dictionary.push(s.to_string());
                            dictionary.len() - 1
                        }
                    }
                }
                None => 0,
            };
            indices.push(idx as u32);
        }
        let validity = ValidityBitmap::from_flags(values.iter().map(Option::is_some));
        Self::Categorical {
            dictionary,
            indices,
            validity,
        }
    }

    /// Free-form text column.
    pub fn from_text<S: AsRef<str>>(values: &[Option<S>]) -> Self {
        let validity = ValidityBitmap::from_flags(values.iter().map(Option::is_some));
        let values = values
            .iter()
            .map(|v| v.as_ref().map(|s| s.as_ref().to_string()).unwrap_or_default())
            .collect();
        Self::Text { values, validity }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Numeric { .. } => DataType::Numeric,
            Self::Boolean { .. } => DataType::Boolean,
            Self::Categorical { .. } => DataType::Categorical,
            Self::Text { .. } => DataType::Text,
        }
    }

    pub fn validity(&self) -> &ValidityBitmap {
        match self {
            Self::Numeric { validity, .. }
            | Self::Boolean { validity, .. }
            | Self::Categorical { validity, .. }
            | Self::Text { validity, .. } => validity,
        }
    }

    pub fn len(&self) -> usize {
        self.validity().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        self.validity().null_count()
    }

    pub fn is_valid(&self, idx: usize) -> bool {
        self.validity().is_valid(idx)
    }

    /// Numeric value at `idx`; `None` if missing or not a numeric column.
    pub fn numeric_at(&self, idx: usize) -> Option<f64> {
        match self {
            Self::Numeric { values, validity } if validity.is_valid(idx) && !values[idx].is_nan() => {
                Some(values[idx])
            }
            _ => None,
        }
    }

    /// Numeric values as options; `None` for non-numeric columns.
    pub fn to_numeric_options(&self) -> Option<Vec<Option<f64>>> {
        match self {
            Self::Numeric { .. } => Some((0..self.len()).map(|i| self.numeric_at(i)).collect()),
            _ => None,
        }
    }

    /// Present values of a numeric column, missing rows skipped.
    pub fn valid_numeric_values(&self) -> Option<Vec<f64>> {
        match self {
            Self::Numeric { values, validity } => {
                Some(
                    validity
                        .valid_indices()
                        .map(|i| values[i])
                        .filter(|v| !v.is_nan())
                        .collect(),
                )
            }
            _ => None,
        }
    }

    /// Grouping key of the value at `idx` for any column type; `None` when
    /// missing. Numbers key on their bit pattern with `-0.0` folded into
    /// `0.0`, so equal numbers always share a key.
    pub(crate) fn key_at(&self, idx: usize) -> Option<String> {
        if !self.is_valid(idx) {
            return None;
        }
        Some(match self {
            Self::Numeric { .. } => {
                let v = self.numeric_at(idx)?;
                let v = if v == 0.0 { 0.0 } else { v };
                format!("{:016x}", v.to_bits())
            }
            Self::Boolean { values, .. } => values[idx].to_string(),
            Self::Categorical {
                dictionary,
                indices,
                ..
            } => dictionary[indices[idx] as usize].clone(),
            Self::Text { values, .. } => values[idx].clone(),
        })
    }
}

// ── DataFrame ─────────────────────────────────────────────────────────

/// Named columns of equal length.
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column.
    ///
    /// The first column fixes the row count; later columns must match it.
    /// Names must be unique.
    pub fn add_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), ParamsError> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(ParamsError::invalid(
                "name",
                format!("duplicate column name '{name}'"),
            ));
        }
        if self.columns.is_empty() {
            self.row_count = column.len();
        } else if column.len() != self.row_count {
            return Err(ParamsError::DimensionMismatch {
                expected: self.row_count,
                actual: column.len(),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── ValidityBitmap ────────────────────────────────────────────

    #[test]
    fn bitmap_all_valid_across_words() {
        let bm = ValidityBitmap::all_valid(65);
        assert_eq!(bm.bits.len(), 2);
        assert_eq!(bm.null_count(), 0);
        assert!(bm.is_valid(64));
    }

    #[test]
    fn bitmap_set_and_count() {
        let mut bm = ValidityBitmap::all_valid(10);
        bm.set_invalid(3);
        bm.set_invalid(7);
        assert_eq!(bm.null_count(), 2);
        bm.set_valid(3);
        assert_eq!(bm.null_count(), 1);
        assert!(!bm.is_valid(7));
    }

    #[test]
    fn bitmap_from_flags() {
        let bm = ValidityBitmap::from_flags((0..130).map(|i| i % 3 != 0));
        assert_eq!(bm.len(), 130);
        assert_eq!(bm.null_count(), (0..130).filter(|i| i % 3 == 0).count());
        let first: Vec<usize> = bm.valid_indices().take(4).collect();
        assert_eq!(first, vec![1, 2, 4, 5]);
    }

    // ── Column ────────────────────────────────────────────────────

    #[test]
    fn numeric_from_options() {
        let col = Column::from_numeric(vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(col.data_type(), DataType::Numeric);
        assert_eq!(col.null_count(), 1);
        assert_eq!(col.numeric_at(0), Some(1.0));
        assert_eq!(col.numeric_at(1), None);
        assert_eq!(col.valid_numeric_values(), Some(vec![1.0, 3.0]));
        assert_eq!(
            col.to_numeric_options(),
            Some(vec![Some(1.0), None, Some(3.0)])
        );
    }

    #[test]
    fn categorical_dictionary_first_appearance() {
        let col = Column::from_categories(&[Some("b"), Some("a"), None, Some("b")]);
        match &col {
            Column::Categorical {
                dictionary,
                indices,
                ..
            } => {
                assert_eq!(dictionary, &["b", "a"]);
                assert_eq!(indices[3], 0);
            }
            other => panic!("expected categorical, got {:?}", other.data_type()),
        }
        assert_eq!(col.key_at(1).as_deref(), Some("a"));
        assert_eq!(col.key_at(2), None);
    }

    #[test]
    fn non_numeric_has_no_numeric_view() {
        let col = Column::from_text(&[Some("x"), Some("y")]);
        assert!(col.to_numeric_options().is_none());
        assert!(col.valid_numeric_values().is_none());
    }

    #[test]
    fn numeric_keys_distinguish_values() {
        let col = Column::from_numeric(vec![Some(1.0), Some(1.0), Some(2.0)]);
        assert_eq!(col.key_at(0), col.key_at(1));
        assert_ne!(col.key_at(0), col.key_at(2));
    }

    #[test]
    fn signed_zero_shares_a_key() {
        let col = Column::from_numeric(vec![Some(0.0), Some(-0.0)]);
        assert!(col.key_at(0).is_some());
        assert_eq!(col.key_at(0), col.key_at(1));
    }

    #[test]
    fn nan_reads_as_missing() {
        let col = Column::from_numeric(vec![Some(1.0), Some(f64::NAN)]);
        assert_eq!(col.null_count(), 1);
        assert_eq!(col.numeric_at(1), None);
        assert_eq!(col.key_at(1), None);

        // NaN behind a set validity bit is still missing
        let raw = Column::Numeric {
            values: vec![f64::NAN, 2.0],
            validity: ValidityBitmap::all_valid(2),
        };
        assert_eq!(raw.to_numeric_options(), Some(vec![None, Some(2.0)]));
        assert_eq!(raw.valid_numeric_values(), Some(vec![2.0]));
        assert_eq!(raw.key_at(0), None);
    }

    // ── DataFrame ─────────────────────────────────────────────────

    #[test]
    fn add_and_lookup_columns() {
        let mut df = DataFrame::new();
        df.add_column("x", Column::from_numeric(vec![Some(1.0), Some(2.0)]))
            .unwrap();
        df.add_column("flag", Column::from_boolean(vec![Some(true), None]))
            .unwrap();
        assert_eq!(df.column_count(), 2);
        assert_eq!(df.column_names(), &["x", "flag"]);
        assert_eq!(
            df.column_by_name("flag").unwrap().data_type(),
            DataType::Boolean
        );
        assert!(df.column_by_name("nope").is_none());
    }

    #[test]
    fn length_mismatch_rejected() {
        let mut df = DataFrame::new();
        df.add_column("x", Column::from_numeric(vec![Some(1.0)]))
            .unwrap();
        let err = df
            .add_column("y", Column::from_numeric(vec![Some(1.0), Some(2.0)]))
            .unwrap_err();
        assert_eq!(
            err,
            ParamsError::DimensionMismatch {
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut df = DataFrame::new();
        df.add_column("x", Column::from_numeric(vec![Some(1.0)]))
            .unwrap();
        assert!(df
            .add_column("x", Column::from_numeric(vec![Some(2.0)]))
            .is_err());
    }
}
