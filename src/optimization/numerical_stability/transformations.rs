//! Numerical stability utilities.
//!
//! Provides guarded forms of the few scalar and row-wise transforms the
//! solver and the policy model evaluate in their inner loops.
//!
//! # Provided items
//! - [`EPSILON`]: floor for ratio denominators (default 1e-6).
//! - [`floored_ratio(num, den)`]: `num / max(den, EPSILON)` with NaN passed
//!   through instead of being absorbed by the floor.
//! - [`safe_softmax_rows(logits)`]: max-shifted softmax over the last axis of
//!   a 2-D array.
//! - [`safe_log_softmax_rows(logits)`]: its logarithm, computed without
//!   taking `ln` of an underflowed probability.

use ndarray::{Array2, ArrayView2, Axis};

/// Floor applied to denominators of improvement ratios.
///
/// Estimated improvements can shrink to zero (or turn negative) during a
/// line search; dividing by at least `EPSILON` keeps the ratio finite and
/// makes the `estimated > EPSILON` guard the one place that stops the loop.
pub const EPSILON: f64 = 1e-6;

/// Ratio `num / max(den, EPSILON)`.
///
/// `f64::max` ignores a NaN operand, which would silently turn a NaN
/// estimate into `EPSILON`. A NaN denominator therefore yields NaN here, so
/// the comparisons downstream evaluate to `false` and halt the search.
///
/// # Parameters
/// - `num`: numerator, any `f64` (NaN propagates).
/// - `den`: denominator, floored at [`EPSILON`].
///
/// # Returns
/// - The floored ratio.
pub fn floored_ratio(num: f64, den: f64) -> f64 {
    if den.is_nan() {
        return f64::NAN;
    }
    num / den.max(EPSILON)
}

/// Row-wise softmax of a `(rows, classes)` array.
///
/// Each row is shifted by its maximum before exponentiation, so large logits
/// never overflow. Rows sum to one up to rounding.
pub fn safe_softmax_rows(logits: ArrayView2<'_, f64>) -> Array2<f64> {
    let mut out = safe_log_softmax_rows(logits);
    out.mapv_inplace(f64::exp);
    out
}

/// Row-wise log-softmax of a `(rows, classes)` array.
///
/// Computes `x - max - ln(sum(exp(x - max)))` per row.
pub fn safe_log_softmax_rows(logits: ArrayView2<'_, f64>) -> Array2<f64> {
    let mut out = logits.to_owned();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let shift = if max.is_finite() { max } else { 0.0 };
        let log_norm = row.iter().map(|&x| (x - shift).exp()).sum::<f64>().ln();
        row.mapv_inplace(|x| x - shift - log_norm);
    }
    out
}
