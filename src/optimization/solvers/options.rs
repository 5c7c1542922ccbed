//! Configuration for the line-search solver.
//!
//! - [`LineSearchMode`]: how the step shrinks between iterations.
//! - [`LineSearchOptions`]: validated coefficients and loop flavor.
//!
//! Coefficients are [`SharedParameter`]s so they can follow a schedule; the
//! solver samples each of them exactly once per `solve` call.
use crate::optimization::{
    errors::{OptError, OptResult},
    parameters::{constant, validate_parameter, SharedParameter},
};
use std::str::FromStr;

/// Movement mode of the line search.
///
/// Variants:
/// - `Linear`: every iteration moves by the same delta; the estimated
///   improvement shrinks by a fixed increment.
/// - `Exponential`: deltas and estimated improvement are multiplied by
///   `parameter` on every iteration.
///
/// Parsing:
/// `FromStr` accepts case-insensitive `"linear"` / `"exponential"`. Unknown
/// names return [`OptError::InvalidLineSearchMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearchMode {
    Linear,
    Exponential,
}

impl FromStr for LineSearchMode {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(LineSearchMode::Linear),
            "exponential" => Ok(LineSearchMode::Exponential),
            _ => Err(OptError::InvalidLineSearchMode {
                mode: s.to_string(),
                reason: "Valid options are case insensitive 'linear' or 'exponential'.",
            }),
        }
    }
}

/// Line-search configuration.
///
/// Fields:
/// - `max_iterations`: upper bound on step evaluations, sampled once per
///   solve and floored to an integer (`>= 0`).
/// - `accept_ratio`: improvement ratio at which the search stops, in `[0, 1]`.
/// - `mode`: [`LineSearchMode`].
/// - `parameter`: movement factor in `[0, 1]`.
/// - `unroll_loop`: run a fixed-length loop with a per-iteration guard
///   instead of a condition-checked loop. Results are identical.
///
/// Default:
/// - `max_iterations = 10`, `accept_ratio = 0.9`, `mode = Exponential`,
///   `parameter = 0.5`, `unroll_loop = false`.
#[derive(Debug, Clone)]
pub struct LineSearchOptions {
    pub max_iterations: SharedParameter,
    pub accept_ratio: SharedParameter,
    pub mode: LineSearchMode,
    pub parameter: SharedParameter,
    pub unroll_loop: bool,
}

impl LineSearchOptions {
    /// Build validated options.
    ///
    /// # Errors
    /// - [`OptError::InvalidLineSearchMode`] for an unknown `mode` name.
    /// - [`OptError::InvalidParameterValue`] if a coefficient can leave its
    ///   admissible range (`max_iterations >= 0`, `accept_ratio` and
    ///   `parameter` in `[0, 1]`).
    pub fn new(
        max_iterations: SharedParameter, accept_ratio: SharedParameter, mode: &str,
        parameter: SharedParameter, unroll_loop: bool,
    ) -> OptResult<Self> {
        let mode = mode.parse::<LineSearchMode>()?;
        validate_parameter("max_iterations", max_iterations.as_ref(), 0.0, f64::INFINITY)?;
        validate_parameter("accept_ratio", accept_ratio.as_ref(), 0.0, 1.0)?;
        validate_parameter("parameter", parameter.as_ref(), 0.0, 1.0)?;
        Ok(Self { max_iterations, accept_ratio, mode, parameter, unroll_loop })
    }

    /// Constant-coefficient shorthand for [`LineSearchOptions::new`].
    pub fn constant(
        max_iterations: usize, accept_ratio: f64, mode: &str, parameter: f64, unroll_loop: bool,
    ) -> OptResult<Self> {
        Self::new(
            constant(max_iterations as f64),
            constant(accept_ratio),
            mode,
            constant(parameter),
            unroll_loop,
        )
    }
}

impl Default for LineSearchOptions {
    fn default() -> Self {
        Self {
            max_iterations: constant(10.0),
            accept_ratio: constant(0.9),
            mode: LineSearchMode::Exponential,
            parameter: constant(0.5),
            unroll_loop: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::parameters::ScalarParameter;

    #[test]
    // Purpose
    // -------
    // Mode names parse case-insensitively; anything else is rejected.
    fn mode_parses_case_insensitively() {
        assert_eq!("Linear".parse::<LineSearchMode>(), Ok(LineSearchMode::Linear));
        assert_eq!("EXPONENTIAL".parse::<LineSearchMode>(), Ok(LineSearchMode::Exponential));
        assert!(matches!(
            "quadratic".parse::<LineSearchMode>(),
            Err(OptError::InvalidLineSearchMode { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Construction fails fast on an invalid mode or an out-of-range
    // coefficient, naming the offending field.
    //
    // Given
    // -----
    // - mode "geometric"; then accept_ratio 1.2; then parameter -0.1.
    //
    // Expect
    // ------
    // - `InvalidLineSearchMode`, then `InvalidParameterValue` for
    //   "accept_ratio" and "parameter".
    fn new_rejects_invalid_configuration() {
        let bad_mode = LineSearchOptions::constant(5, 0.9, "geometric", 0.5, false);
        let bad_ratio = LineSearchOptions::constant(5, 1.2, "linear", 0.5, false);
        let bad_param = LineSearchOptions::constant(5, 0.9, "linear", -0.1, false);

        assert!(matches!(bad_mode, Err(OptError::InvalidLineSearchMode { .. })));
        assert!(matches!(
            bad_ratio,
            Err(OptError::InvalidParameterValue { ref name, .. }) if name == "accept_ratio"
        ));
        assert!(matches!(
            bad_param,
            Err(OptError::InvalidParameterValue { ref name, .. }) if name == "parameter"
        ));
    }

    #[test]
    // Purpose
    // -------
    // Defaults match the documented values.
    fn default_values() {
        let opts = LineSearchOptions::default();

        assert_eq!(opts.max_iterations.value(), 10.0);
        assert_eq!(opts.accept_ratio.value(), 0.9);
        assert_eq!(opts.mode, LineSearchMode::Exponential);
        assert_eq!(opts.parameter.value(), 0.5);
        assert!(!opts.unroll_loop);
    }
}
