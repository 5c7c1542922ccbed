//! Execution helper that runs an `argmin` solver on an adapted objective and
//! returns a crate-friendly [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    proposal::{
        adapter::ArgMinAdapter,
        traits::{Objective, OptimOutcome, ProposalOptions},
        types::{Grad, Theta},
    },
};
use argmin::core::{CostFunction, Executor, Gradient, State};
use argmin_math::ArgminL2Norm;
use slog::{debug, Logger};

/// Run an `argmin` solver for an adapted objective.
///
/// Wires up the problem, the solver, the flattened start point, the
/// optional iteration cap and (with the `obs_slog` feature and
/// `opts.verbose`) argmin's slog observer, then converts the final state
/// into an [`OptimOutcome`] laid out like `problem.layout`.
///
/// # Errors
/// - Propagates argmin runtime errors through `From<argmin::core::Error>`;
///   objective errors come back as their original [`OptError`] variant.
/// - Propagates validation errors raised while building the outcome.
///
/// [`OptError`]: crate::optimization::errors::OptError
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &ProposalOptions, problem: ArgMinAdapter<'a, F>, solver: S,
    logger: &Logger,
) -> OptResult<OptimOutcome>
where
    F: Objective,
    S: argmin::core::Solver<
            ArgMinAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    log_initial_state(&theta0, &problem, logger)?;
    let layout = problem.layout;
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    let outcome = OptimOutcome::new(
        result.take_best_param(),
        layout,
        -result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )?;
    debug!(logger, "proposal finished";
        "value" => outcome.value,
        "iterations" => outcome.iterations,
        "status" => &outcome.status);
    Ok(outcome)
}

// ---- Helper Methods ----

fn log_initial_state<F>(
    theta0: &Theta, problem: &ArgMinAdapter<'_, F>, logger: &Logger,
) -> OptResult<()>
where
    F: Objective,
{
    let f0 = -problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());
    debug!(logger, "proposal start"; "value" => f0, "grad_norm" => g0n);
    Ok(())
}
