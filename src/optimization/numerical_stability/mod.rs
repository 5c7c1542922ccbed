//! numerical_stability — guarded numeric helpers shared by solver and models.
//!
//! Purpose
//! -------
//! Centralize the small tolerance ([`EPSILON`]) and the guarded transforms
//! used wherever an improvement ratio or a categorical distribution is
//! evaluated, so the solver and the policy model agree on one floor and one
//! softmax.
//!
//! Key behaviors
//! -------------
//! - `floored_ratio` divides by `max(den, EPSILON)` while keeping NaN
//!   visible to the caller.
//! - `safe_softmax_rows` / `safe_log_softmax_rows` normalize logits with a
//!   per-row max shift.
//!
//! Conventions
//! -----------
//! - This module never logs, performs I/O, or touches global state.
//!
//! Downstream usage
//! ----------------
//! - `solvers::line_search` computes every improvement ratio with
//!   `floored_ratio` and uses `EPSILON` in its continuation predicate.
//! - `agent::models::policy_gradient` evaluates action probabilities with
//!   the softmax helpers.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    floored_ratio, safe_log_softmax_rows, safe_softmax_rows, EPSILON,
};

pub mod prelude {
    pub use super::transformations::{
        floored_ratio, safe_log_softmax_rows, safe_softmax_rows, EPSILON,
    };
}
