//! linesearch_step — proposal followed by backtracking line search.
//!
//! Purpose
//! -------
//! Perform one trust-region style update of a structured parameter set:
//! propose a step with L-BFGS, then let the [`LineSearch`] shrink it until
//! the realized improvement matches what the step promised.
//!
//! Key behaviors
//! -------------
//! - `base_value = f(x0)`; `full_step = x_hat - x0` from [`maximize`];
//!   `target_value = f(x0 + full_step)`.
//! - `estimated_improvement = ∇f(x0) · full_step`, or `target - base` when
//!   the objective has no analytic gradient.
//! - The line search receives a `DeltaFn` that moves a working copy of the
//!   parameters by each delta and evaluates `f` there.
//! - The accepted step is applied only if it does not lower the objective;
//!   otherwise the parameters stay at `x0`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `params` is either left untouched or replaced by a point whose value
//!   is at least `base_value`.
//! - Every intermediate point shares keys and shapes with `params`.
//!
//! Downstream usage
//! ----------------
//! - `agent::models::policy_gradient` calls [`LinesearchStep::step`] once
//!   per `update`.
use crate::{
    optimization::{
        errors::{OptError, OptResult},
        proposal::{maximize, validation::validate_value, Objective, ProposalOptions},
        solvers::{Iterative, LineSearch, LineSearchArgs, LineSearchOptions},
    },
    structured::StructuredValue,
    utils::discard_logger,
};
use slog::{debug, info, o, Logger};

/// Configuration of one line-search step.
///
/// Default: [`LineSearchOptions::default`] and [`ProposalOptions::default`].
#[derive(Debug, Clone, Default)]
pub struct LinesearchStepOptions {
    pub line_search: LineSearchOptions,
    pub proposal: ProposalOptions,
}

impl LinesearchStepOptions {
    pub fn new(line_search: LineSearchOptions, proposal: ProposalOptions) -> Self {
        Self { line_search, proposal }
    }
}

/// Report of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub base_value: f64,
    pub target_value: f64,
    pub estimated_improvement: f64,
    /// Objective value at the parameters after the step.
    pub final_value: f64,
    /// `false` when the step was discarded and the parameters kept.
    pub accepted: bool,
    /// Applied change, zero when the step was discarded.
    pub applied: StructuredValue,
    pub proposal_iterations: usize,
}

/// Proposal + line-search optimizer.
#[derive(Debug, Clone)]
pub struct LinesearchStep {
    options: LinesearchStepOptions,
    line_search: LineSearch,
    logger: Logger,
}

impl LinesearchStep {
    pub fn new(options: LinesearchStepOptions) -> Self {
        let line_search = LineSearch::new(options.line_search.clone());
        Self { options, line_search, logger: discard_logger() }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.line_search = self.line_search.with_logger(logger.clone());
        self.logger = logger.new(o!("optimizer" => "linesearch_step"));
        self
    }

    pub fn options(&self) -> &LinesearchStepOptions {
        &self.options
    }

    /// Update `params` in place to (weakly) increase `f`.
    ///
    /// Parameters
    /// ----------
    /// - `f`: objective to maximize.
    /// - `data`: payload passed to every evaluation.
    /// - `params`: current point; replaced by the accepted point.
    ///
    /// Errors
    /// ------
    /// - Errors from `f.check`, `f.value`, `f.grad` (other than
    ///   `GradientNotImplemented`), the proposal run and the line search.
    /// - [`OptError::NonFiniteCost`] if `f(x0)` is not finite.
    pub fn step<F: Objective>(
        &self, f: &F, data: &F::Data, params: &mut StructuredValue,
    ) -> OptResult<StepOutcome> {
        f.check(params, data)?;
        let x0 = params.clone();
        let base_value = f.value(&x0, data)?;
        validate_value(base_value)?;

        let proposal = maximize(f, &x0, data, &self.options.proposal, &self.logger)?;
        let full_step = proposal.x_hat.try_sub(&x0)?;
        let mut working = x0.try_add(&full_step)?;
        let target_value = f.value(&working, data)?;
        let estimated_improvement = match f.grad(&x0, data) {
            Ok(grad) => grad.dot(&full_step)?,
            Err(OptError::GradientNotImplemented) => target_value - base_value,
            Err(e) => return Err(e),
        };
        debug!(self.logger, "step proposed";
            "base_value" => base_value,
            "target_value" => target_value,
            "estimated_improvement" => estimated_improvement,
            "step_norm" => full_step.l2_norm());

        let mut fn_x = |deltas: &StructuredValue| -> OptResult<f64> {
            working = working.try_add(deltas)?;
            f.value(&working, data)
        };
        let args =
            LineSearchArgs { x_init: full_step, base_value, target_value, estimated_improvement };
        let accepted_step = self.line_search.solve(args, &mut fn_x)?;

        let candidate = x0.try_add(&accepted_step)?;
        let candidate_value = f.value(&candidate, data)?;
        let accepted = candidate_value.is_finite() && candidate_value >= base_value;
        let (applied, final_value) = if accepted {
            *params = candidate;
            (accepted_step, candidate_value)
        } else {
            (x0.zeros_like(), base_value)
        };
        info!(self.logger, "line search step";
            "accepted" => accepted,
            "base_value" => base_value,
            "final_value" => final_value);
        Ok(StepOutcome {
            base_value,
            target_value,
            estimated_improvement,
            final_value,
            accepted,
            applied,
            proposal_iterations: proposal.iterations,
        })
    }
}
