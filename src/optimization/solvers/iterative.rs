//! Generic bounded iteration scheme.
//!
//! Purpose
//! -------
//! Factor the control flow shared by iterative solvers out of the solvers
//! themselves. An [`Iterative`] solver supplies four hooks (`start`, `step`,
//! `next_step`, `end`) and an iteration budget; [`Iterative::solve`] runs
//!
//! ```text
//! state = start(args, max)
//! while iterations < max && next_step(state) { state = step(state) }
//! return end(state)
//! ```
//!
//! Key behaviors
//! -------------
//! - The budget is sampled once per `solve` from the solver's
//!   `max_iterations` parameter and handed to `start`.
//! - Looped execution checks the condition before every step. Unrolled
//!   execution runs a fixed number of passes and guards each with
//!   `next_step`; once the guard fails the state is never touched again, so
//!   both flavors return identical results.
//!
//! Invariants & assumptions
//! ------------------------
//! - `step` is called at most `max_iterations` times.
//! - With a zero budget the result is `end(start(args, 0))`.
//! - `next_step` is a pure function of the state.
use crate::{optimization::errors::OptResult, structured::StructuredValue};

/// Callable evaluating the objective after moving the captured parameters by
/// `deltas`. Moves accumulate: calling with `d` then `-d` restores the
/// captured state.
pub trait DeltaFn: FnMut(&StructuredValue) -> OptResult<f64> {}

impl<F> DeltaFn for F where F: FnMut(&StructuredValue) -> OptResult<f64> {}

/// Hooks of a bounded iterative solver.
pub trait Iterative {
    type Args;
    type State;
    type Output;

    /// Iteration budget for the next `solve` call.
    fn iteration_limit(&self) -> OptResult<usize>;

    /// Use the unrolled loop flavor.
    fn unroll_loop(&self) -> bool;

    /// Initial state for a run of at most `max_iterations` steps; no
    /// objective evaluation may happen here.
    fn start(&self, args: Self::Args, max_iterations: usize) -> OptResult<Self::State>;

    /// One iteration.
    fn step<F: DeltaFn>(&self, state: Self::State, fn_x: &mut F) -> OptResult<Self::State>;

    /// Continuation predicate evaluated before each step.
    fn next_step(&self, state: &Self::State) -> bool;

    /// Final result.
    fn end<F: DeltaFn>(&self, state: Self::State, fn_x: &mut F) -> OptResult<Self::Output>;

    /// Run the full iteration scheme.
    ///
    /// # Errors
    /// - Propagates errors from any hook or from `fn_x`.
    fn solve<F: DeltaFn>(&self, args: Self::Args, fn_x: &mut F) -> OptResult<Self::Output>
    where
        Self: Sized,
    {
        let max_iterations = self.iteration_limit()?;
        let state = self.start(args, max_iterations)?;
        let state = if self.unroll_loop() {
            run_unrolled(self, state, max_iterations, fn_x)?
        } else {
            run_looped(self, state, max_iterations, fn_x)?
        };
        self.end(state, fn_x)
    }
}

/// Condition-checked loop.
pub fn run_looped<S: Iterative, F: DeltaFn>(
    solver: &S, mut state: S::State, max_iterations: usize, fn_x: &mut F,
) -> OptResult<S::State> {
    let mut iterations = 0;
    while iterations < max_iterations && solver.next_step(&state) {
        state = solver.step(state, fn_x)?;
        iterations += 1;
    }
    Ok(state)
}

/// Fixed-length loop with a per-pass guard.
pub fn run_unrolled<S: Iterative, F: DeltaFn>(
    solver: &S, mut state: S::State, max_iterations: usize, fn_x: &mut F,
) -> OptResult<S::State> {
    for _ in 0..max_iterations {
        if solver.next_step(&state) {
            state = solver.step(state, fn_x)?;
        }
    }
    Ok(state)
}
