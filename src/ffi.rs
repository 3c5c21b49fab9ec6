//! C FFI bindings for u-params.
//!
//! - **`#[repr(C)]`** data transfer structs
//! - **Integer error codes**: 0 = success, negative = error
//! - **Thread-local error message**: `params_last_error()`
//! - **Caller-owned buffers**: output arrays are allocated by the caller,
//!   so nothing returned here needs freeing
//! - **`catch_unwind`** around every entry point
//!
//! Matrices cross the boundary row-major as `n_rows * n_cols` doubles.
//! `NaN` marks a missing loading in both directions.

use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::panic;
use std::ptr;
use std::slice;

use crate::distribution::{describe_distribution, DescribeConfig};
use crate::error::ParamsError;
use crate::loadings::LoadingMatrix;
use crate::organize::{filter_loadings, sort_order, Threshold};

// ── Error handling ────────────────────────────────────────────────────

pub const PARAMS_OK: i32 = 0;
pub const PARAMS_ERR_NULL_PTR: i32 = -1;
pub const PARAMS_ERR_INVALID_INPUT: i32 = -2;
pub const PARAMS_ERR_PANIC: i32 = -99;

/// `mode` for `params_filter_loadings`: numeric threshold, cutoff below 1,
/// per-column count from 1 up.
pub const PARAMS_FILTER_VALUE: i32 = 0;
/// `mode` for `params_filter_loadings`: keep each row's largest loading.
pub const PARAMS_FILTER_MAX_PER_ROW: i32 = 1;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = CString::new(msg).ok();
    });
}

/// Returns the last error message on this thread, or null.
///
/// # Safety
/// The caller must not free the returned pointer. It stays valid until
/// the next failing call on this thread.
#[no_mangle]
pub extern "C" fn params_last_error() -> *const c_char {
    LAST_ERROR.with(|cell| match cell.borrow().as_ref() {
        Some(msg) => msg.as_ptr(),
        None => ptr::null(),
    })
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn params_clear_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

/// Runs `body`, mapping errors and panics to codes and the last error.
fn guarded<F>(name: &str, body: F) -> i32
where
    F: FnOnce() -> Result<(), (i32, String)> + panic::UnwindSafe,
{
    match panic::catch_unwind(body) {
        Ok(Ok(())) => PARAMS_OK,
        Ok(Err((code, msg))) => {
            set_last_error(&msg);
            code
        }
        Err(_) => {
            set_last_error(&format!("panic in {name}"));
            PARAMS_ERR_PANIC
        }
    }
}

fn invalid(e: ParamsError) -> (i32, String) {
    (PARAMS_ERR_INVALID_INPUT, e.to_string())
}

fn null_ptr() -> (i32, String) {
    (PARAMS_ERR_NULL_PTR, "null pointer".to_string())
}

/// Builds a matrix labelled `V1..` × `F1..` from row-major raw values.
///
/// # Safety
/// `data` must point to `n_rows * n_cols` readable doubles.
unsafe fn matrix_from_raw(
    data: *const f64,
    n_rows: usize,
    n_cols: usize,
) -> Result<LoadingMatrix, ParamsError> {
    let raw = unsafe { slice::from_raw_parts(data, n_rows * n_cols) };
    let rows = if n_cols == 0 {
        vec![Vec::new(); n_rows]
    } else {
        raw.chunks(n_cols).map(<[f64]>::to_vec).collect()
    };
    LoadingMatrix::from_rows(
        (1..=n_rows).map(|i| format!("V{i}")).collect(),
        (1..=n_cols).map(|j| format!("F{j}")).collect(),
        rows,
    )
}

// ── Loading organizer ─────────────────────────────────────────────────

/// Computes the sorted row order of a loading matrix.
///
/// # Safety
/// - `data` must point to `n_rows * n_cols` doubles (row-major).
/// - `out_order` must point to `n_rows` writable `u32` slots; it receives
///   original row indices in sorted order.
#[no_mangle]
pub unsafe extern "C" fn params_sort_loadings(
    data: *const f64,
    n_rows: u32,
    n_cols: u32,
    out_order: *mut u32,
) -> i32 {
    guarded("params_sort_loadings", || {
        if data.is_null() || out_order.is_null() {
            return Err(null_ptr());
        }
        let matrix =
            unsafe { matrix_from_raw(data, n_rows as usize, n_cols as usize) }.map_err(invalid)?;
        let order = sort_order(&matrix);
        let out = unsafe { slice::from_raw_parts_mut(out_order, order.len()) };
        for (slot, row) in out.iter_mut().zip(order) {
            *slot = row as u32;
        }
        Ok(())
    })
}

/// Masks a loading matrix; removed cells are written as `NaN`.
///
/// `mode` is [`PARAMS_FILTER_VALUE`] (uses `threshold`) or
/// [`PARAMS_FILTER_MAX_PER_ROW`] (ignores it).
///
/// # Safety
/// - `data` must point to `n_rows * n_cols` doubles (row-major).
/// - `out` must point to `n_rows * n_cols` writable doubles.
#[no_mangle]
pub unsafe extern "C" fn params_filter_loadings(
    data: *const f64,
    n_rows: u32,
    n_cols: u32,
    mode: i32,
    threshold: f64,
    out: *mut f64,
) -> i32 {
    guarded("params_filter_loadings", || {
        if data.is_null() || out.is_null() {
            return Err(null_ptr());
        }
        let threshold = match mode {
            PARAMS_FILTER_VALUE => Threshold::from_value(threshold).map_err(invalid)?,
            PARAMS_FILTER_MAX_PER_ROW => Threshold::MaxPerRow,
            other => {
                return Err((
                    PARAMS_ERR_INVALID_INPUT,
                    format!("unknown filter mode {other}"),
                ))
            }
        };
        let (n, d) = (n_rows as usize, n_cols as usize);
        let matrix = unsafe { matrix_from_raw(data, n, d) }.map_err(invalid)?;
        let filtered = filter_loadings(&matrix, threshold).map_err(invalid)?;

        let out = unsafe { slice::from_raw_parts_mut(out, n * d) };
        for i in 0..n {
            for j in 0..d {
                out[i * d + j] = filtered.get(i, j).unwrap_or(f64::NAN);
            }
        }
        Ok(())
    })
}

// ── Distribution description ──────────────────────────────────────────

/// C-compatible distribution summary.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct CDistributionSummary {
    pub n_obs: u64,
    pub n_missing: u64,
    pub mean: f64,
    pub median: f64,
    pub sd: f64,
    pub mad: f64,
    pub iqr: f64,
    pub min: f64,
    pub max: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

/// Describes `n` doubles (`NaN` = missing) with default settings.
///
/// # Safety
/// - `data` must point to `n` doubles.
/// - `out` must point to a valid `CDistributionSummary`.
#[no_mangle]
pub unsafe extern "C" fn params_describe(
    data: *const f64,
    n: u32,
    out: *mut CDistributionSummary,
) -> i32 {
    guarded("params_describe", || {
        if data.is_null() || out.is_null() {
            return Err(null_ptr());
        }
        let raw = unsafe { slice::from_raw_parts(data, n as usize) };
        let d = describe_distribution(raw, &DescribeConfig::default()).map_err(invalid)?;
        unsafe {
            *out = CDistributionSummary {
                n_obs: d.n_obs as u64,
                n_missing: d.n_missing as u64,
                mean: d.mean,
                median: d.median,
                sd: d.sd,
                mad: d.mad,
                iqr: d.iqr,
                min: d.min,
                max: d.max,
                skewness: d.skewness,
                kurtosis: d.kurtosis,
            };
        }
        Ok(())
    })
}

/// Returns the library version string (static, do not free).
#[no_mangle]
pub extern "C" fn params_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn ffi_version() {
        let v = unsafe { CStr::from_ptr(params_version()) }.to_str().unwrap();
        assert_eq!(v, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn ffi_error_lifecycle() {
        params_clear_error();
        assert!(params_last_error().is_null());

        set_last_error("boom");
        let msg = unsafe { CStr::from_ptr(params_last_error()) }.to_str().unwrap();
        assert_eq!(msg, "boom");

        params_clear_error();
        assert!(params_last_error().is_null());
    }

    #[test]
    fn ffi_sort() {
        let data = [0.8, 0.1, 0.2, 0.7, 0.75, 0.05, 0.1, 0.65];
        let mut order = [0u32; 4];
        let rc = unsafe { params_sort_loadings(data.as_ptr(), 4, 2, order.as_mut_ptr()) };
        assert_eq!(rc, PARAMS_OK);
        assert_eq!(order, [0, 2, 1, 3]);
    }

    #[test]
    fn ffi_sort_null_ptr() {
        let mut order = [0u32; 1];
        let rc = unsafe { params_sort_loadings(ptr::null(), 1, 1, order.as_mut_ptr()) };
        assert_eq!(rc, PARAMS_ERR_NULL_PTR);
        assert!(!params_last_error().is_null());
    }

    #[test]
    fn ffi_sort_empty_matrix() {
        let data = [0.0f64; 1];
        let mut order = [0u32; 1];
        let rc = unsafe { params_sort_loadings(data.as_ptr(), 0, 0, order.as_mut_ptr()) };
        assert_eq!(rc, PARAMS_ERR_INVALID_INPUT);
    }

    #[test]
    fn ffi_filter_cutoff() {
        let data = [0.8, 0.1, 0.2, 0.7];
        let mut out = [0.0; 4];
        let rc = unsafe {
            params_filter_loadings(data.as_ptr(), 2, 2, PARAMS_FILTER_VALUE, 0.5, out.as_mut_ptr())
        };
        assert_eq!(rc, PARAMS_OK);
        assert_eq!(out[0], 0.8);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_eq!(out[3], 0.7);
    }

    #[test]
    fn ffi_filter_max_per_row() {
        let data = [0.3, -0.6, 0.9, 0.2];
        let mut out = [0.0; 4];
        let rc = unsafe {
            params_filter_loadings(
                data.as_ptr(),
                2,
                2,
                PARAMS_FILTER_MAX_PER_ROW,
                0.0,
                out.as_mut_ptr(),
            )
        };
        assert_eq!(rc, PARAMS_OK);
        assert!(out[0].is_nan());
        assert_eq!(out[1], -0.6);
        assert_eq!(out[2], 0.9);
        assert!(out[3].is_nan());
    }

    #[test]
    fn ffi_filter_rejects_bad_input() {
        let data = [0.8, 0.1, 0.2, 0.7];
        let mut out = [0.0; 4];
        let rc = unsafe {
            params_filter_loadings(data.as_ptr(), 2, 2, PARAMS_FILTER_VALUE, 5.0, out.as_mut_ptr())
        };
        assert_eq!(rc, PARAMS_ERR_INVALID_INPUT);

        let rc = unsafe { params_filter_loadings(data.as_ptr(), 2, 2, 7, 0.5, out.as_mut_ptr()) };
        assert_eq!(rc, PARAMS_ERR_INVALID_INPUT);
        let msg = unsafe { CStr::from_ptr(params_last_error()) }.to_str().unwrap();
        assert!(msg.contains("unknown filter mode"));
    }

    #[test]
    fn ffi_describe() {
        let data = [1.0, 2.0, f64::NAN, 3.0];
        let mut out = CDistributionSummary::default();
        let rc = unsafe { params_describe(data.as_ptr(), 4, &mut out) };
        assert_eq!(rc, PARAMS_OK);
        assert_eq!(out.n_obs, 3);
        assert_eq!(out.n_missing, 1);
        assert!((out.mean - 2.0).abs() < 1e-12);
    }

    #[test]
    fn ffi_describe_all_missing() {
        let data = [f64::NAN];
        let mut out = CDistributionSummary::default();
        let rc = unsafe { params_describe(data.as_ptr(), 1, &mut out) };
        assert_eq!(rc, PARAMS_ERR_INVALID_INPUT);
    }
}
