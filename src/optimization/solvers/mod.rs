//! solvers — iterative solvers over structured values.
//!
//! Purpose
//! -------
//! Host the generic bounded iteration scheme ([`Iterative`]) and the
//! backtracking [`LineSearch`] built on it.
//!
//! Key behaviors
//! -------------
//! - [`Iterative::solve`] runs `start`, a bounded sequence of `step`s guarded
//!   by `next_step`, and `end`, in looped or unrolled form.
//! - [`LineSearch`] shrinks a proposed step in linear or exponential mode
//!   until the improvement ratio stalls or reaches `accept_ratio`.
//!
//! Conventions
//! -----------
//! - The objective is reached only through a [`DeltaFn`] that moves the
//!   captured parameters by a delta and returns the new value.
//!
//! Downstream usage
//! ----------------
//! - `optimization::linesearch_step` feeds a proposal from the L-BFGS
//!   proposal layer into [`LineSearch::solve`](Iterative::solve).

pub mod iterative;
pub mod line_search;
pub mod options;

pub use self::iterative::{DeltaFn, Iterative};
pub use self::line_search::{
    Additional, Coefficients, LineSearch, LineSearchArgs, LineSearchState,
};
pub use self::options::{LineSearchMode, LineSearchOptions};

pub mod prelude {
    pub use super::iterative::{DeltaFn, Iterative};
    pub use super::line_search::{LineSearch, LineSearchArgs};
    pub use super::options::{LineSearchMode, LineSearchOptions};
}
