//! optimization — solvers, step proposals and the unified error surface.
//!
//! Purpose
//! -------
//! Provide the numeric core used by policy updates: a generic bounded
//! iteration scheme with a backtracking line search, an argmin-backed
//! L-BFGS proposal layer, scalar parameter providers, and a single
//! error/result surface.
//!
//! Key behaviors
//! -------------
//! - `solvers`: [`solvers::Iterative`] plus [`solvers::LineSearch`] over
//!   structured values.
//! - `proposal`: maximize an [`proposal::Objective`] with L-BFGS.
//! - `linesearch_step`: proposal followed by line search, applied to a
//!   parameter set in place.
//! - `parameters`: constant and scheduled coefficients.
//! - `numerical_stability`: shared epsilon and guarded transforms.
//! - `errors`: [`errors::OptError`] and [`errors::OptResult`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Invalid configuration and numerical failures are reported as
//!   `OptError`, not panics.
//! - Every operation combining structured values checks keys (and, for
//!   tensor arithmetic, shapes) before touching data.
//!
//! Conventions
//! -----------
//! - Objectives are maximized; the proposal layer minimizes `-f`
//!   internally and reports values in objective space.
//! - Logging goes through `slog` loggers handed in by the caller; the
//!   default is a discarding logger.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule.
//! - `tests/integration_line_search.rs` replays full solver traces with
//!   scripted objectives.

pub mod errors;
pub mod linesearch_step;
pub mod numerical_stability;
pub mod parameters;
pub mod proposal;
pub mod solvers;

pub use self::linesearch_step::{LinesearchStep, LinesearchStepOptions, StepOutcome};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_rlopt::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::linesearch_step::{LinesearchStep, LinesearchStepOptions, StepOutcome};
    pub use super::numerical_stability::prelude::*;
    pub use super::parameters::prelude::*;
    pub use super::proposal::prelude::*;
    pub use super::solvers::prelude::*;
}
