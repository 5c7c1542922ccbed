//! Scalar parameter providers.
//!
//! Purpose
//! -------
//! Solver coefficients (`max_iterations`, `accept_ratio`, `parameter`) and
//! model hyper-parameters are not plain numbers: each may be constant or
//! follow a schedule over training steps. [`ScalarParameter`] is the narrow
//! interface the solver reads once per `solve` call.
//!
//! Key behaviors
//! -------------
//! - [`Constant`] returns a fixed value.
//! - [`Scheduled`] evaluates a [`Schedule`] at the current value of a shared
//!   [`Clock`].
//! - [`validate_parameter`] checks that everything a provider can produce
//!   lies inside an admissible interval.
//!
//! Invariants & assumptions
//! ------------------------
//! - Providers are immutable from the reader's perspective; only the clock
//!   advances, and only its owner advances it.
//! - [`Clock`] is shared through an `Arc<AtomicU64>`, so cloned handles
//!   observe the same step.
use crate::optimization::{
    errors::{OptError, OptResult},
    parameters::schedule::Schedule,
};
use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

/// Read-only scalar provider.
pub trait ScalarParameter: Send + Sync + Debug {
    /// Current value.
    fn value(&self) -> f64;

    /// Closed interval `(min, max)` containing every value this provider can
    /// return.
    fn bounds(&self) -> (f64, f64);
}

/// Shared handle to a scalar provider, cheap to clone into option structs.
pub type SharedParameter = Arc<dyn ScalarParameter>;

/// Wrap a constant into a [`SharedParameter`].
pub fn constant(value: f64) -> SharedParameter {
    Arc::new(Constant(value))
}

/// Fixed scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant(pub f64);

impl ScalarParameter for Constant {
    fn value(&self) -> f64 {
        self.0
    }

    fn bounds(&self) -> (f64, f64) {
        (self.0, self.0)
    }
}

/// Global step counter shared between the agent and its schedules.
#[derive(Debug, Clone, Default)]
pub struct Clock(Arc<AtomicU64>);

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Advance by `steps` and return the new value.
    pub fn advance(&self, steps: u64) -> u64 {
        self.0.fetch_add(steps, Ordering::Relaxed) + steps
    }

    pub fn set(&self, step: u64) {
        self.0.store(step, Ordering::Relaxed);
    }
}

/// Schedule evaluated against a [`Clock`].
#[derive(Debug, Clone)]
pub struct Scheduled {
    schedule: Schedule,
    clock: Clock,
}

impl Scheduled {
    /// # Errors
    /// - [`OptError::InvalidSchedule`] if the schedule definition is invalid.
    pub fn new(name: &str, schedule: Schedule, clock: Clock) -> OptResult<Self> {
        schedule.validate(name)?;
        Ok(Self { schedule, clock })
    }

    /// Same as [`Scheduled::new`], boxed into a [`SharedParameter`].
    pub fn shared(name: &str, schedule: Schedule, clock: Clock) -> OptResult<SharedParameter> {
        Ok(Arc::new(Self::new(name, schedule, clock)?))
    }
}

impl ScalarParameter for Scheduled {
    fn value(&self) -> f64 {
        self.schedule.value_at(self.clock.now())
    }

    fn bounds(&self) -> (f64, f64) {
        self.schedule.range()
    }
}

/// Ensure every value `param` can produce lies in `[min, max]`.
///
/// # Parameters
/// - `name`: parameter name, reported in the error.
/// - `param`: provider to check.
/// - `min`, `max`: admissible closed interval (either may be infinite).
///
/// # Errors
/// - [`OptError::InvalidParameterValue`] with the offending bound.
pub fn validate_parameter(
    name: &str, param: &dyn ScalarParameter, min: f64, max: f64,
) -> OptResult<()> {
    let (low, high) = param.bounds();
    if low.is_nan() || high.is_nan() {
        return Err(OptError::InvalidParameterValue {
            name: name.to_string(),
            value: f64::NAN,
            reason: "Parameter values must not be NaN.",
        });
    }
    if low < min {
        return Err(OptError::InvalidParameterValue {
            name: name.to_string(),
            value: low,
            reason: "Parameter can fall below its lower bound.",
        });
    }
    if high > max {
        return Err(OptError::InvalidParameterValue {
            name: name.to_string(),
            value: high,
            reason: "Parameter can exceed its upper bound.",
        });
    }
    Ok(())
}
