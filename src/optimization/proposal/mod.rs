//! proposal — argmin-powered step proposals over structured values.
//!
//! Purpose
//! -------
//! Provide the quasi-Newton half of a line-search update: given an
//! [`Objective`] and a structured start point, run L-BFGS (More–Thuente or
//! Hager–Zhang line search) and return the best point found as an
//! [`OptimOutcome`]. The step from the start point to that outcome is what
//! the backtracking line search later shrinks.
//!
//! Key behaviors
//! -------------
//! - Flatten structured points into `Array1<f64>` for argmin and restore the
//!   layout on the way out ([`adapter::ArgMinAdapter`]).
//! - Convert maximization into minimization of `c = -f`; analytic gradients
//!   are flattened and negated, missing ones fall back to `finitediff`.
//! - Centralize configuration ([`Tolerances`], [`ProposalOptions`]) and
//!   validation ([`validation`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Objectives report failures as [`OptError`] values, never panics.
//! - Options are validated at construction and treated as consistent here.
//!
//! Conventions
//! -----------
//! - Outcome values are in objective space (`f`), never cost space.
//! - Errors raised inside the objective travel through argmin and come back
//!   as their original variant.
//!
//! Testing notes
//! -------------
//! - `adapter` tests cover sign conventions and the FD fallback.
//! - `api` tests run full L-BFGS solves on concave quadratics.
//!
//! [`OptError`]: crate::optimization::errors::OptError

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, Objective, OptimOutcome, ProposalOptions, Tolerances};
pub use self::types::{Cost, FnEvalMap, Grad, Theta, DEFAULT_LBFGS_MEM};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, Objective, OptimOutcome, ProposalOptions, Tolerances};
}
