//! Backtracking line search over structured values.
//!
//! Purpose
//! -------
//! Given a proposed step `x_init` whose objective value (`target_value`) and
//! estimated improvement over a base value are known, shrink the step until
//! the realized improvement ratio stops improving, reaches `accept_ratio`,
//! or the estimate becomes negligible.
//!
//! Key behaviors
//! -------------
//! - `start` computes the initial ratio `(target - base) / max(estimate,
//!   EPSILON)` and the first delta `-x_init * parameter`. No evaluation.
//! - `step` moves `x` by the current delta and evaluates `fn_x` at the next
//!   delta. Linear mode keeps the delta fixed and decrements the estimate;
//!   exponential mode multiplies both by `parameter`.
//! - `next_step` continues while the ratio improved, is still below
//!   `accept_ratio`, and the estimate exceeds `EPSILON`.
//! - `end` accepts `x + deltas` if the last step improved the ratio, and
//!   otherwise undoes the last evaluation with `fn_x(-deltas)` and returns
//!   `x`. With a zero budget, `x_init` is returned untouched. A search that
//!   stops before its first step (ratio already at `accept_ratio`) takes the
//!   accept branch, since `last_improvement = improvement - 1`, and returns
//!   `x_init * (1 - parameter)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `x` and every delta share keys and shapes with `x_init`.
//! - `accept_ratio` and `parameter` are sampled once in `start` and carried
//!   in the state; the iteration budget is sampled once per `solve`.
//! - NaN objective values make every comparison false, which halts the loop
//!   and takes the undo path.
//!
//! Testing notes
//! -------------
//! - Unit tests drive the solver with scripted `fn_x` stubs that record
//!   every delta they receive.
//! - The end-to-end trace lives in `tests/integration_line_search.rs`.
use crate::{
    optimization::{
        errors::{OptError, OptResult},
        numerical_stability::{floored_ratio, EPSILON},
        solvers::{
            iterative::{DeltaFn, Iterative},
            options::{LineSearchMode, LineSearchOptions},
        },
    },
    structured::StructuredValue,
    utils::discard_logger,
};
use slog::{debug, o, Logger};

/// Mode-specific carry of the line search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Additional {
    Linear { base_value: f64, estimated_incr: f64 },
    Exponential { base_value: f64 },
}

impl Additional {
    pub fn base_value(&self) -> f64 {
        match *self {
            Additional::Linear { base_value, .. } | Additional::Exponential { base_value } => {
                base_value
            }
        }
    }
}

/// Coefficients sampled once at `start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub accept_ratio: f64,
    pub parameter: f64,
}

/// Inputs of one `solve` call.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSearchArgs {
    /// Full proposed step.
    pub x_init: StructuredValue,
    /// Objective value before the step.
    pub base_value: f64,
    /// Objective value after the full step.
    pub target_value: f64,
    /// Estimated improvement of the full step.
    pub estimated_improvement: f64,
}

/// Loop state.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSearchState {
    pub x: StructuredValue,
    pub deltas: StructuredValue,
    pub improvement: f64,
    pub last_improvement: f64,
    pub estimated: f64,
    pub additional: Additional,
    pub coefficients: Coefficients,
    /// Number of `step` calls performed so far.
    pub iteration: usize,
    /// Iteration budget of the running `solve`.
    pub budget: usize,
}

/// Line-search solver. Reentrant: `solve` only borrows `&self`.
#[derive(Debug, Clone)]
pub struct LineSearch {
    options: LineSearchOptions,
    logger: Logger,
}

impl LineSearch {
    pub fn new(options: LineSearchOptions) -> Self {
        Self { options, logger: discard_logger() }
    }

    /// Attach a logger; the solver logs at `debug` level per iteration.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger.new(o!("solver" => "line_search"));
        self
    }

    pub fn options(&self) -> &LineSearchOptions {
        &self.options
    }
}

impl Iterative for LineSearch {
    type Args = LineSearchArgs;
    type State = LineSearchState;
    type Output = StructuredValue;

    fn iteration_limit(&self) -> OptResult<usize> {
        let value = self.options.max_iterations.value();
        if !value.is_finite() || value < 0.0 {
            return Err(OptError::InvalidParameterValue {
                name: "max_iterations".to_string(),
                value,
                reason: "Iteration budget must be finite and non-negative.",
            });
        }
        Ok(value.floor() as usize)
    }

    fn unroll_loop(&self) -> bool {
        self.options.unroll_loop
    }

    fn start(&self, args: LineSearchArgs, max_iterations: usize) -> OptResult<LineSearchState> {
        let LineSearchArgs { x_init, base_value, target_value, estimated_improvement } = args;
        let coefficients = Coefficients {
            accept_ratio: self.options.accept_ratio.value(),
            parameter: self.options.parameter.value(),
        };
        let improvement = floored_ratio(target_value - base_value, estimated_improvement);
        let last_improvement = improvement - 1.0;
        let deltas = x_init.scale(-coefficients.parameter);
        let additional = match self.options.mode {
            LineSearchMode::Linear => Additional::Linear {
                base_value,
                estimated_incr: -estimated_improvement * coefficients.parameter,
            },
            LineSearchMode::Exponential => Additional::Exponential { base_value },
        };
        debug!(self.logger, "line search start";
            "improvement" => improvement,
            "estimated" => estimated_improvement,
            "accept_ratio" => coefficients.accept_ratio,
            "parameter" => coefficients.parameter);
        Ok(LineSearchState {
            x: x_init,
            deltas,
            improvement,
            last_improvement,
            estimated: estimated_improvement,
            additional,
            coefficients,
            iteration: 0,
            budget: max_iterations,
        })
    }

    fn step<F: DeltaFn>(&self, state: LineSearchState, fn_x: &mut F) -> OptResult<LineSearchState> {
        let LineSearchState {
            x, deltas, improvement, estimated, additional, coefficients, iteration, budget, ..
        } = state;
        let next_x = x.try_add(&deltas)?;
        let (next_deltas, next_estimated) = match additional {
            Additional::Linear { estimated_incr, .. } => (deltas, estimated + estimated_incr),
            Additional::Exponential { .. } => (
                deltas.scale(coefficients.parameter),
                estimated * coefficients.parameter,
            ),
        };
        let target_value = fn_x(&next_deltas)?;
        let next_improvement =
            floored_ratio(target_value - additional.base_value(), next_estimated);
        debug!(self.logger, "line search step";
            "iteration" => iteration + 1,
            "target_value" => target_value,
            "improvement" => next_improvement,
            "estimated" => next_estimated);
        Ok(LineSearchState {
            x: next_x,
            deltas: next_deltas,
            improvement: next_improvement,
            last_improvement: improvement,
            estimated: next_estimated,
            additional,
            coefficients,
            iteration: iteration + 1,
            budget,
        })
    }

    fn next_step(&self, state: &LineSearchState) -> bool {
        state.improvement > state.last_improvement
            && state.improvement < state.coefficients.accept_ratio
            && state.estimated > EPSILON
    }

    fn end<F: DeltaFn>(&self, state: LineSearchState, fn_x: &mut F) -> OptResult<StructuredValue> {
        if state.budget == 0 {
            debug!(self.logger, "line search without budget");
            return Ok(state.x);
        }
        if state.improvement > state.last_improvement {
            debug!(self.logger, "line search accepted last step"; "iterations" => state.iteration);
            return state.x.try_add(&state.deltas);
        }
        let undo = state.deltas.neg();
        let _ = fn_x(&undo)?;
        debug!(self.logger, "line search undid last step"; "iterations" => state.iteration);
        Ok(state.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{optimization::parameters::constant, structured::Structured};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - start: ratio, first delta, mode-specific carry.
    // - step: linear vs exponential delta and estimate updates.
    // - next_step boundaries (strict `<` against accept_ratio).
    // - end: zero-step, accept and undo paths.
    //
    // The full scripted trace is covered by the integration tests.
    // -------------------------------------------------------------------------

    fn scalar(name: &str, value: f64) -> StructuredValue {
        Structured::from_pairs([(name, array![value].into_dyn())]).expect("unique")
    }

    fn solver(max: usize, accept: f64, mode: &str, parameter: f64) -> LineSearch {
        LineSearch::new(
            LineSearchOptions::constant(max, accept, mode, parameter, false).expect("valid"),
        )
    }

    fn args(target: f64, estimate: f64) -> LineSearchArgs {
        LineSearchArgs {
            x_init: scalar("a", 10.0),
            base_value: 0.0,
            target_value: target,
            estimated_improvement: estimate,
        }
    }

    fn first(value: &StructuredValue) -> f64 {
        value.values()[0].iter().copied().next().unwrap_or(f64::NAN)
    }

    #[test]
    // Purpose
    // -------
    // `start` computes the ratio, the first delta and the linear increment
    // without evaluating anything.
    fn start_computes_initial_state() {
        let solver = solver(5, 0.9, "linear", 0.5);

        let state = solver.start(args(4.0, 8.0), 5).expect("start");

        assert_abs_diff_eq!(state.improvement, 0.5);
        assert_abs_diff_eq!(state.last_improvement, -0.5);
        assert_abs_diff_eq!(first(&state.deltas), -5.0);
        assert_eq!(state.additional, Additional::Linear { base_value: 0.0, estimated_incr: -4.0 });
        assert_eq!(state.iteration, 0);
        assert_eq!(state.budget, 5);
    }

    #[test]
    // Purpose
    // -------
    // In exponential mode each evaluated delta is the previous one times
    // `parameter`.
    //
    // Given
    // -----
    // - x_init 10, parameter 0.5, an objective that never reaches accept.
    //
    // Expect
    // ------
    // - `fn_x` receives -2.5, -1.25, -0.625 on successive steps.
    fn exponential_deltas_decay_geometrically() {
        let solver = solver(3, 1.0, "exponential", 0.5);
        let mut seen = Vec::new();
        let mut values = vec![1.0, 2.0, 3.0].into_iter();
        let mut fn_x = |d: &StructuredValue| -> OptResult<f64> {
            seen.push(first(d));
            Ok(values.next().unwrap_or(0.0))
        };

        let _ = solver.solve(args(0.5, 100.0), &mut fn_x).expect("solve");

        assert_eq!(&seen[..3], &[-2.5, -1.25, -0.625]);
    }

    #[test]
    // Purpose
    // -------
    // In linear mode every evaluated delta is identical.
    fn linear_deltas_stay_constant() {
        let solver = solver(3, 1.0, "linear", 0.1);
        let mut seen = Vec::new();
        let mut values = vec![1.0, 2.0, 3.0].into_iter();
        let mut fn_x = |d: &StructuredValue| -> OptResult<f64> {
            seen.push(first(d));
            Ok(values.next().unwrap_or(0.0))
        };

        let _ = solver.solve(args(0.5, 100.0), &mut fn_x).expect("solve");

        assert_eq!(&seen[..3], &[-1.0, -1.0, -1.0]);
    }

    #[test]
    // Purpose
    // -------
    // A ratio exactly equal to `accept_ratio` stops the search before any
    // evaluation; `end` takes the accept branch and returns `x + deltas`.
    //
    // Given
    // -----
    // - x_init 10, ratio 4 / 8 = 0.5 = accept_ratio, linear, parameter 0.5.
    //
    // Expect
    // ------
    // - no `fn_x` call; result 10 - 5 = 5.
    fn improvement_equal_to_accept_ratio_terminates() {
        let solver = solver(5, 0.5, "linear", 0.5);
        let mut calls = 0;
        let mut fn_x = |_: &StructuredValue| -> OptResult<f64> {
            calls += 1;
            Ok(0.0)
        };

        let out = solver.solve(args(4.0, 8.0), &mut fn_x).expect("solve");

        assert_eq!(calls, 0);
        assert_eq!(out, scalar("a", 5.0));
    }

    #[test]
    // Purpose
    // -------
    // A ratio already above `accept_ratio` also accepts the first shrunk
    // point without evaluating it.
    //
    // Given
    // -----
    // - budget 5, accept 0.4, x_init 10, ratio 0.5, linear, parameter 0.5.
    //
    // Expect
    // ------
    // - no `fn_x` call; result 5, for looped and unrolled runs alike.
    fn ratio_above_accept_takes_first_shrink() {
        for unroll in [false, true] {
            let options =
                LineSearchOptions::constant(5, 0.4, "linear", 0.5, unroll).expect("valid");
            let solver = LineSearch::new(options);
            let mut calls = 0;
            let mut fn_x = |_: &StructuredValue| -> OptResult<f64> {
                calls += 1;
                Ok(0.0)
            };

            let out = solver.solve(args(4.0, 8.0), &mut fn_x).expect("solve");

            assert_eq!(calls, 0);
            assert_abs_diff_eq!(first(&out), 5.0);
        }
    }

    #[test]
    // Purpose
    // -------
    // With a zero budget `fn_x` is never called and `x_init` comes back.
    fn zero_iterations_returns_x_init() {
        let solver = solver(0, 0.9, "exponential", 0.5);
        let mut calls = 0;
        let mut fn_x = |_: &StructuredValue| -> OptResult<f64> {
            calls += 1;
            Ok(0.0)
        };

        let out = solver.solve(args(4.0, 8.0), &mut fn_x).expect("solve");

        assert_eq!(calls, 0);
        assert_eq!(out, scalar("a", 10.0));
    }

    #[test]
    // Purpose
    // -------
    // When the last step made things worse, `end` calls `fn_x` with exactly
    // the negated last delta.
    //
    // Given
    // -----
    // - linear, parameter 0.5; first step scores 3.0 (ratio 0.75), second
    //   step scores -1.0 (ratio collapses).
    //
    // Expect
    // ------
    // - Calls: -5, -5, then +5 (undo); result is x after two moves = 0.
    fn undo_path_negates_last_delta() {
        let solver = solver(5, 0.9, "linear", 0.5);
        let mut seen = Vec::new();
        let mut values = vec![3.0, -1.0, 99.0].into_iter();
        let mut fn_x = |d: &StructuredValue| -> OptResult<f64> {
            seen.push(first(d));
            Ok(values.next().unwrap_or(0.0))
        };

        let out = solver.solve(args(4.0, 8.0), &mut fn_x).expect("solve");

        assert_eq!(seen, vec![-5.0, -5.0, 5.0]);
        assert_abs_diff_eq!(first(&out), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // A NaN objective halts the search and triggers the undo path.
    fn nan_objective_halts_and_undoes() {
        let solver = solver(5, 0.9, "exponential", 0.5);
        let mut seen = Vec::new();
        let mut fn_x = |d: &StructuredValue| -> OptResult<f64> {
            seen.push(first(d));
            Ok(f64::NAN)
        };

        let out = solver.solve(args(4.0, 8.0), &mut fn_x).expect("solve");

        assert_eq!(seen, vec![-2.5, 2.5]);
        assert_abs_diff_eq!(first(&out), 5.0);
    }

    #[test]
    // Purpose
    // -------
    // Errors from `fn_x` propagate out of `solve`.
    fn fn_x_errors_propagate() {
        let solver = solver(5, 0.9, "linear", 0.5);
        let mut fn_x =
            |_: &StructuredValue| -> OptResult<f64> { Err(OptError::NonFiniteCost { value: f64::NAN }) };

        let result = solver.solve(args(4.0, 8.0), &mut fn_x);

        assert!(matches!(result, Err(OptError::NonFiniteCost { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Coefficients are sampled once per solve: a schedule changing between
    // calls affects the next solve, not the running one.
    fn coefficients_are_sampled_at_start() {
        let options = LineSearchOptions::new(
            constant(3.0),
            constant(0.9),
            "exponential",
            constant(0.25),
            true,
        )
        .expect("valid");
        let solver = LineSearch::new(options);

        let state = solver.start(args(4.0, 8.0), 3).expect("start");

        assert_eq!(state.coefficients, Coefficients { accept_ratio: 0.9, parameter: 0.25 });
        assert_abs_diff_eq!(first(&state.deltas), -2.5);
    }
}
