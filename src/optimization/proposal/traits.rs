//! Public surface of the proposal layer.
//!
//! - [`Objective`]: trait models implement for the quantity being maximized.
//! - [`ProposalOptions`] and [`Tolerances`]: configuration for L-BFGS.
//! - [`LineSearcher`]: choice of argmin line search used inside L-BFGS.
//! - [`OptimOutcome`]: normalized result returned by `maximize`.
//!
//! Convention: we *maximize* an objective `f(x)` over structured values by
//! minimizing the cost `c(θ) = -f(unflatten(θ))`. An analytic gradient, if
//! provided, is the gradient of `f` with the same keys and shapes as `x`;
//! the adapter flattens it and flips the sign.
use crate::{
    optimization::{
        errors::{OptError, OptResult},
        proposal::{
            types::{FnEvalMap, Grad, Theta},
            validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
        },
    },
    structured::StructuredValue,
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// Objective maximized by the proposal and line-search layers.
///
/// - `type Data`: payload carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&x, &data) -> OptResult<f64>`: evaluate `f(x)`.
/// - `check(&x, &data) -> OptResult<()>`: reject invalid `x`/`data` pairs
///   before any optimization starts.
///
/// Optional:
/// - `grad(&x, &data) -> OptResult<StructuredValue>`: analytic `∇f(x)`.
///   If not implemented, finite differences are used for the proposal and
///   the line search falls back to the realized improvement as estimate.
pub trait Objective {
    type Data: 'static;

    // Required methods
    fn value(&self, x: &StructuredValue, data: &Self::Data) -> OptResult<f64>;
    fn check(&self, x: &StructuredValue, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _x: &StructuredValue, _data: &Self::Data) -> OptResult<StructuredValue> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing is case-insensitive (`"MoreThuente"`, `"HagerZhang"`). Unknown
/// names return [`OptError::InvalidLineSearcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearcher {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Proposal configuration.
///
/// Fields:
/// - `tols: Tolerances` — numerical tolerances and iteration limits.
/// - `line_searcher: LineSearcher` — line-search algorithm used by L-BFGS.
/// - `verbose: bool` — if `true`, attaches an argmin slog observer (behind
///   the `obs_slog` feature).
/// - `lbfgs_mem: Option<usize>` — history size, `None` for the default of 7.
///
/// Default:
/// - `tols`: `tol_grad = 1e-6`, `tol_cost = None`, `max_iter = 100`
/// - `line_searcher`: `MoreThuente`
/// - `verbose`: `false`
/// - `lbfgs_mem`: `None`
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl ProposalOptions {
    /// # Errors
    /// - [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if lbfgs_mem == Some(0) {
            return Err(OptError::InvalidLBFGSMem {
                mem: 0,
                reason: "L-BFGS memory must be greater than zero.",
            });
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }
}

impl Default for ProposalOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(100) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Numerical tolerances and iteration limits.
///
/// At least one of the three fields must be provided (see
/// [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == Some(0)`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if max_iter == Some(0) {
            return Err(OptError::InvalidMaxIter {
                max_iter: 0,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Result of a proposal run.
///
/// - `x_hat`: best point found, with the keys and shapes of the start point.
/// - `value`: objective value `f(x_hat)` (not the cost).
/// - `converged`: `true` if argmin reported a terminating status.
/// - `status`: human-readable termination status.
/// - `iterations`: optimizer iterations performed.
/// - `fn_evals`: argmin's function-evaluation counters.
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub x_hat: StructuredValue,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated outcome from raw solver state.
    ///
    /// # Errors
    /// - Propagates validation errors for `theta_hat` and `value`.
    /// - [`OptError::LayoutMismatch`] if `theta_hat` does not fit `layout`.
    pub fn new(
        theta_hat_opt: Option<Theta>, layout: &StructuredValue, value: f64,
        termination: TerminationStatus, iterations: u64, fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let x_hat = layout.unflatten_like(&theta_hat)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            other => (true, format!("{other:?}")),
        };
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            x_hat,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm,
        })
    }
}
