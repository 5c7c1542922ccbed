//! Step-indexed scalar schedules.
//!
//! A [`Schedule`] maps a non-negative step counter to an `f64`. Schedules are
//! pure functions of the step; the step itself comes from a shared
//! [`Clock`](super::provider::Clock) owned by the agent.
use crate::optimization::errors::{OptError, OptResult};

/// Scalar schedule evaluated at a global step.
#[derive(Debug, Clone, PartialEq)]
pub enum Schedule {
    /// Same value at every step.
    Constant(f64),
    /// Linear interpolation from `initial` to `final_value` over
    /// `decay_steps`, then held at `final_value`.
    Linear { initial: f64, final_value: f64, decay_steps: u64 },
    /// `initial * decay_rate^(step / decay_steps)`; with `staircase` the
    /// exponent is floored.
    Exponential { initial: f64, decay_rate: f64, decay_steps: u64, staircase: bool },
    /// `values[i]` for the `i`-th interval delimited by increasing
    /// `boundaries`; `values.len() == boundaries.len() + 1`.
    Piecewise { boundaries: Vec<u64>, values: Vec<f64> },
}

impl Schedule {
    /// Check the schedule definition.
    ///
    /// # Errors
    /// - [`OptError::InvalidSchedule`] naming `name` when a value is
    ///   non-finite, `decay_steps == 0`, `decay_rate <= 0`, or the piecewise
    ///   boundaries/values are inconsistent.
    pub fn validate(&self, name: &str) -> OptResult<()> {
        let fail = |reason| Err(OptError::InvalidSchedule { name: name.to_string(), reason });
        match self {
            Schedule::Constant(value) => {
                if !value.is_finite() {
                    return fail("Constant value must be finite.");
                }
            }
            Schedule::Linear { initial, final_value, decay_steps } => {
                if !initial.is_finite() || !final_value.is_finite() {
                    return fail("Linear endpoints must be finite.");
                }
                if *decay_steps == 0 {
                    return fail("decay_steps must be positive.");
                }
            }
            Schedule::Exponential { initial, decay_rate, decay_steps, .. } => {
                if !initial.is_finite() {
                    return fail("Initial value must be finite.");
                }
                if !decay_rate.is_finite() || *decay_rate <= 0.0 {
                    return fail("decay_rate must be finite and positive.");
                }
                if *decay_steps == 0 {
                    return fail("decay_steps must be positive.");
                }
            }
            Schedule::Piecewise { boundaries, values } => {
                if values.len() != boundaries.len() + 1 {
                    return fail("Piecewise schedules need one more value than boundaries.");
                }
                if boundaries.windows(2).any(|w| w[0] >= w[1]) {
                    return fail("Piecewise boundaries must be strictly increasing.");
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return fail("Piecewise values must be finite.");
                }
            }
        }
        Ok(())
    }

    /// Value of the schedule at `step`.
    pub fn value_at(&self, step: u64) -> f64 {
        match self {
            Schedule::Constant(value) => *value,
            Schedule::Linear { initial, final_value, decay_steps } => {
                let fraction = (step.min(*decay_steps) as f64) / (*decay_steps as f64);
                initial + (final_value - initial) * fraction
            }
            Schedule::Exponential { initial, decay_rate, decay_steps, staircase } => {
                let mut exponent = step as f64 / *decay_steps as f64;
                if *staircase {
                    exponent = exponent.floor();
                }
                initial * decay_rate.powf(exponent)
            }
            Schedule::Piecewise { boundaries, values } => {
                let index = boundaries.iter().take_while(|&&b| step >= b).count();
                values.get(index).or(values.last()).copied().unwrap_or(f64::NAN)
            }
        }
    }

    /// Closed interval containing every value the schedule can produce.
    ///
    /// Exponential schedules approach zero without reaching it, so their
    /// range is reported as `[min(0, initial), max(0, initial)]` when
    /// `decay_rate < 1`, and unbounded on the growing side otherwise.
    pub fn range(&self) -> (f64, f64) {
        match self {
            Schedule::Constant(value) => (*value, *value),
            Schedule::Linear { initial, final_value, .. } => {
                (initial.min(*final_value), initial.max(*final_value))
            }
            Schedule::Exponential { initial, decay_rate, .. } => {
                if *decay_rate <= 1.0 {
                    (initial.min(0.0), initial.max(0.0))
                } else if *initial >= 0.0 {
                    (*initial, f64::INFINITY)
                } else {
                    (f64::NEG_INFINITY, *initial)
                }
            }
            Schedule::Piecewise { values, .. } => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (min, max)
            }
        }
    }
}
