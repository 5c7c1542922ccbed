//! High-level entry point for proposing a step on an [`Objective`].
//!
//! Selects an L-BFGS solver with either Hager–Zhang or More–Thuente line
//! search, wraps the objective in an [`ArgMinAdapter`] (which *minimizes*
//! `-f`), and delegates the run to [`run_lbfgs`].
use crate::{
    optimization::{
        errors::OptResult,
        proposal::{
            adapter::ArgMinAdapter,
            builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
            run::run_lbfgs,
            traits::{LineSearcher, Objective, OptimOutcome, ProposalOptions},
        },
    },
    structured::StructuredValue,
};
use slog::Logger;

/// Maximize `f` starting from `x0` with L-BFGS.
///
/// # Behavior
/// - Validates the start point via `f.check(x0, data)`.
/// - Flattens `x0`; the outcome is unflattened back into its layout.
/// - Builds the solver selected by `opts.line_searcher` and runs it.
///
/// # Errors
/// - Propagates any error from `f.check`, the builders or the run.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use rust_rlopt::optimization::errors::OptResult;
/// use rust_rlopt::optimization::proposal::{maximize, Objective, ProposalOptions};
/// use rust_rlopt::structured::{Structured, StructuredValue};
/// use rust_rlopt::utils::discard_logger;
///
/// struct Peak;
/// impl Objective for Peak {
///     type Data = ();
///     fn value(&self, x: &StructuredValue, _: &()) -> OptResult<f64> {
///         Ok(-x.dot(x)?)
///     }
///     fn check(&self, _: &StructuredValue, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let x0: StructuredValue = Structured::from_pairs([("w", array![0.5, -0.2].into_dyn())])?;
/// let out = maximize(&Peak, &x0, &(), &ProposalOptions::default(), &discard_logger())?;
/// println!("x̂ = {:?}", out.x_hat);
/// # Ok::<(), rust_rlopt::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: Objective>(
    f: &F, x0: &StructuredValue, data: &F::Data, opts: &ProposalOptions, logger: &Logger,
) -> OptResult<OptimOutcome> {
    f.check(x0, data)?;
    let theta0 = x0.flatten();
    let problem = ArgMinAdapter::new(f, data, x0);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver, logger)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver, logger)
        }
    }
}
