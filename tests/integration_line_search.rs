//! Integration tests for the line-search solver and the proposal + line
//! search step.
//!
//! Purpose
//! -------
//! - Replay complete line-search traces against scripted objectives and
//!   check every delta the solver evaluates, the returned step, and the
//!   undo evaluation.
//! - Run a full `LinesearchStep` on a concave quadratic, from L-BFGS
//!   proposal to accepted update.
//!
//! Coverage
//! --------
//! - `optimization::solvers::LineSearch`:
//!   - Linear mode accept and undo paths, exponential decay, zero budget.
//!   - Looped vs unrolled execution.
//! - `optimization::linesearch_step::LinesearchStep`:
//!   - Proposal, estimated improvement and in-place application.
//!
//! Exclusions
//! ----------
//! - Coefficient validation and single-hook behavior are covered by unit
//!   tests next to the solver.
use approx::assert_abs_diff_eq;
use ndarray::array;
use rust_rlopt::{
    optimization::{
        errors::{OptError, OptResult},
        linesearch_step::{LinesearchStep, LinesearchStepOptions},
        proposal::{LineSearcher, Objective, ProposalOptions, Tolerances},
        solvers::{Iterative, LineSearch, LineSearchArgs, LineSearchOptions},
    },
    structured::{Structured, StructuredValue},
};
use std::collections::VecDeque;

fn scalar(value: f64) -> StructuredValue {
    Structured::from_pairs([("a", array![value].into_dyn())]).expect("unique")
}

fn first(value: &StructuredValue) -> f64 {
    value.require("a").expect("key a").iter().copied().next().expect("one element")
}

/// Replays `values` in order and records the first element of every delta.
struct Script {
    values: VecDeque<f64>,
    calls: Vec<f64>,
}

impl Script {
    fn new(values: &[f64]) -> Self {
        Self { values: values.iter().copied().collect(), calls: Vec::new() }
    }

    fn eval(&mut self, deltas: &StructuredValue) -> OptResult<f64> {
        self.calls.push(first(deltas));
        Ok(self.values.pop_front().unwrap_or(f64::NAN))
    }
}

fn run(
    mode: &str, parameter: f64, max_iterations: usize, unroll: bool, values: &[f64],
    target_value: f64, estimated_improvement: f64, x_init: f64,
) -> (f64, Vec<f64>) {
    let options =
        LineSearchOptions::constant(max_iterations, 0.9, mode, parameter, unroll).expect("valid");
    let solver = LineSearch::new(options);
    let args = LineSearchArgs {
        x_init: scalar(x_init),
        base_value: 0.0,
        target_value,
        estimated_improvement,
    };
    let mut script = Script::new(values);
    let result = solver.solve(args, &mut |d: &StructuredValue| script.eval(d)).expect("solve");
    (first(&result), script.calls)
}

#[test]
// Purpose
// -------
// Linear trace that ends on an improving step returns `x + deltas`.
//
// Given
// -----
// - x_init = 10, base 0, target 4, estimate 8, linear, parameter 0.5,
//   accept 0.9, budget 5; scripted values 3.0 then 2.0.
//
// Expect
// ------
// - ratios 0.5 -> 0.75 -> 2 / EPSILON, which passes accept_ratio and stops.
// - evaluated deltas [-5, -5]; returned step -5.
fn linear_trace_accepts_last_step() {
    let (result, calls) = run("linear", 0.5, 5, false, &[3.0, 2.0], 4.0, 8.0, 10.0);

    assert_eq!(calls, vec![-5.0, -5.0]);
    assert_abs_diff_eq!(result, -5.0);
}

#[test]
// Purpose
// -------
// When the last step lowers the ratio, its delta is undone and the
// previous point returned.
//
// Given
// -----
// - Same configuration; scripted values 3.0 then -1.0.
//
// Expect
// ------
// - evaluated deltas [-5, -5] plus the undo +5; returned step 0.
fn linear_trace_undoes_worsening_step() {
    let (result, calls) = run("linear", 0.5, 5, false, &[3.0, -1.0], 4.0, 8.0, 10.0);

    assert_eq!(calls, vec![-5.0, -5.0, 5.0]);
    assert_abs_diff_eq!(result, 0.0);
}

#[test]
// Purpose
// -------
// Exponential mode halves deltas and estimate on every step.
//
// Given
// -----
// - x_init = 8, target 1, estimate 8, parameter 0.5, budget 3; every
//   evaluation returns 1.0, so the ratio doubles: 0.125, 0.25, 0.5, 1.0.
//
// Expect
// ------
// - evaluated deltas [-2, -1, -0.5]; returned step 8 - 4 - 2 - 1 - 0.5.
fn exponential_trace_decays_deltas() {
    let (result, calls) = run("exponential", 0.5, 3, false, &[1.0, 1.0, 1.0], 1.0, 8.0, 8.0);

    assert_eq!(calls, vec![-2.0, -1.0, -0.5]);
    assert_abs_diff_eq!(result, 0.5);
}

#[test]
// Purpose
// -------
// A zero budget returns the proposal untouched without evaluating.
fn zero_budget_returns_x_init() {
    let (result, calls) = run("linear", 0.5, 0, false, &[3.0], 4.0, 8.0, 10.0);

    assert!(calls.is_empty());
    assert_abs_diff_eq!(result, 10.0);
}

#[test]
// Purpose
// -------
// With budget left but the first ratio already past `accept_ratio`, the
// search stops before its first step and accepts the first shrunk point.
//
// Given
// -----
// - x_init = 10, base 0, target 4, estimate 8 (ratio 0.5), linear,
//   parameter 0.5, accept 0.4, budget 5.
//
// Expect
// ------
// - no evaluation; returned step 10 * (1 - 0.5) = 5.
fn early_stop_accepts_first_shrink() {
    let options = LineSearchOptions::constant(5, 0.4, "linear", 0.5, false).expect("valid");
    let args = LineSearchArgs {
        x_init: scalar(10.0),
        base_value: 0.0,
        target_value: 4.0,
        estimated_improvement: 8.0,
    };
    let mut script = Script::new(&[]);

    let result =
        LineSearch::new(options).solve(args, &mut |d: &StructuredValue| script.eval(d)).expect("solve");

    assert!(script.calls.is_empty());
    assert_abs_diff_eq!(first(&result), 5.0);
}

#[test]
// Purpose
// -------
// Looped and unrolled execution produce the same trace and result.
fn unrolled_matches_looped() {
    for values in [&[3.0, 2.0][..], &[3.0, -1.0][..], &[3.5, 3.6, 3.65, 3.7][..]] {
        let looped = run("linear", 0.25, 4, false, values, 4.0, 8.0, 10.0);
        let unrolled = run("linear", 0.25, 4, true, values, 4.0, 8.0, 10.0);

        assert_eq!(looped, unrolled);
    }
}

#[test]
// Purpose
// -------
// Errors raised by the objective abort the solve.
fn objective_errors_propagate() {
    let solver = LineSearch::new(LineSearchOptions::default());
    let args = LineSearchArgs {
        x_init: scalar(1.0),
        base_value: 0.0,
        target_value: 0.1,
        estimated_improvement: 1.0,
    };

    let result = solver.solve(args, &mut |_: &StructuredValue| -> OptResult<f64> {
        Err(OptError::NonFiniteCost { value: f64::NAN })
    });

    assert!(result.is_err());
}

/// `f(x) = -|x - c|²` with `c = {a: [1, -2], b: [0.5]}`.
struct Quadratic;

fn center() -> StructuredValue {
    Structured::from_pairs([("a", array![1.0, -2.0].into_dyn()), ("b", array![0.5].into_dyn())])
        .expect("unique")
}

impl Objective for Quadratic {
    type Data = StructuredValue;

    fn value(&self, x: &StructuredValue, c: &StructuredValue) -> OptResult<f64> {
        let diff = x.try_sub(c)?;
        Ok(-diff.dot(&diff)?)
    }

    fn check(&self, x: &StructuredValue, c: &StructuredValue) -> OptResult<()> {
        x.try_sub(c).map(|_| ())
    }

    fn grad(&self, x: &StructuredValue, c: &StructuredValue) -> OptResult<StructuredValue> {
        Ok(x.try_sub(c)?.scale(-2.0))
    }
}

#[test]
// Purpose
// -------
// One full step on a concave quadratic improves the objective and updates
// the parameters in place.
//
// Given
// -----
// - x0 = 0, base value -5.25; L-BFGS lands on c, so target ≈ 0 and the
//   estimated improvement ∇f(0) · c = 2|c|² = 10.5.
//
// Expect
// ------
// - accepted step with final value above the base value, applied equal to
//   the parameter change.
fn linesearch_step_improves_quadratic() {
    let options = LinesearchStepOptions::new(
        LineSearchOptions::constant(10, 0.9, "exponential", 0.5, false).expect("valid"),
        ProposalOptions::new(
            Tolerances::new(Some(1e-8), None, Some(50)).expect("valid"),
            LineSearcher::MoreThuente,
            false,
            None,
        )
        .expect("valid"),
    );
    let c = center();
    let mut params = c.zeros_like();

    let outcome = LinesearchStep::new(options).step(&Quadratic, &c, &mut params).expect("step");

    assert_abs_diff_eq!(outcome.base_value, -5.25, epsilon = 1e-12);
    assert_abs_diff_eq!(outcome.target_value, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(outcome.estimated_improvement, 10.5, epsilon = 1e-4);
    assert!(outcome.accepted);
    assert!(outcome.final_value > outcome.base_value);
    assert_abs_diff_eq!(
        Quadratic.value(&params, &c).expect("value"),
        outcome.final_value,
        epsilon = 1e-12
    );
    assert_eq!(params, outcome.applied);
}
