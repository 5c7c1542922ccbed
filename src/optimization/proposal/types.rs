//! proposal::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the flat numeric types argmin works with and the pre-wired
//! L-BFGS aliases used to propose a step. Structured points are flattened
//! into [`Theta`] at the argmin boundary and unflattened on the way back.
//!
//! Conventions
//! -----------
//! - `Cost` is the negated objective; the proposal layer maximizes.
//! - `DEFAULT_LBFGS_MEM` is the history size used when options leave it
//!   unset.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Flattened parameter vector.
pub type Theta = Array1<f64>;

/// Flattened gradient, same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Scalar cost `c(θ) = -f(θ)`.
pub type Cost = f64;

/// Function-evaluation counters reported by argmin (e.g. `"cost_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
