//! parameters — constant and scheduled scalar providers.
//!
//! Purpose
//! -------
//! Supply the scalar coefficients consumed by the solvers and models as
//! read-only providers that may change over training steps.
//!
//! Key behaviors
//! -------------
//! - [`ScalarParameter`] is the provider interface (`value`, `bounds`).
//! - [`Constant`] and [`Scheduled`] implement it; [`Schedule`] covers
//!   constant, linear, exponential and piecewise decay.
//! - [`validate_parameter`] enforces admissible ranges at construction time.
//!
//! Downstream usage
//! ----------------
//! - `solvers::LineSearchOptions` stores its coefficients as
//!   [`SharedParameter`] and samples each once per `solve`.
//! - The agent owns the [`Clock`] and advances it with the timestep counter.

pub mod provider;
pub mod schedule;

pub use self::provider::{
    constant, validate_parameter, Clock, Constant, ScalarParameter, Scheduled, SharedParameter,
};
pub use self::schedule::Schedule;

pub mod prelude {
    pub use super::provider::{constant, Clock, ScalarParameter, Scheduled, SharedParameter};
    pub use super::schedule::Schedule;
}
