//! proposal::builders — L-BFGS solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the L-BFGS solvers that propose a
//! step before the line search runs. These helpers hide argmin's generic
//! wiring and apply crate-level options (tolerances, memory size).
//!
//! Key behaviors
//! -------------
//! - Construct L-BFGS solvers with either Hager–Zhang or More–Thuente
//!   line search.
//! - Apply optional gradient and cost-change tolerances from
//!   [`ProposalOptions`] via a shared configuration helper.
//!
//! Conventions
//! -----------
//! - The builders do **not** set an initial parameter vector or
//!   `max_iters`; these are applied by the runner.
//! - Argmin configuration errors are surfaced as [`OptError`] through the
//!   crate's `From<argmin::core::Error>` conversion.
//!
//! [`OptError`]: crate::optimization::errors::OptError
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    proposal::{
        traits::ProposalOptions,
        types::{
            Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Theta,
            DEFAULT_LBFGS_MEM,
        },
    },
};

/// Construct L-BFGS with Hager–Zhang line search.
///
/// Parameters
/// ----------
/// - `opts`: consults `lbfgs_mem` (default [`DEFAULT_LBFGS_MEM`]) and the
///   optional `tol_grad` / `tol_cost`.
///
/// Errors
/// ------
/// - `OptError` when argmin rejects a tolerance.
pub fn build_optimizer_hager_zhang(opts: &ProposalOptions) -> OptResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Construct L-BFGS with More–Thuente line search.
///
/// Same parameters and errors as [`build_optimizer_hager_zhang`].
pub fn build_optimizer_more_thuente(opts: &ProposalOptions) -> OptResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply optional tolerances to an L-BFGS solver, whatever its line search.
///
/// When a tolerance is `None` the corresponding `with_tolerance_*` method is
/// not called and argmin's default remains in effect.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &ProposalOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}
