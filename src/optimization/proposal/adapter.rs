//! Adapter that exposes an [`Objective`] over structured values as an
//! `argmin` problem over flat vectors.
//!
//! We convert a *maximization* of `f(x)` into a *minimization* by defining
//! the cost as `c(θ) = -f(unflatten(θ))`. Analytic gradients (if provided)
//! are flattened in key order and negated. If a gradient is not provided, we
//! finite-difference the **cost** closure, so no sign flip is needed in that
//! branch.
use std::cell::RefCell;

use crate::{
    optimization::{
        errors::{OptError, OptResult},
        proposal::{
            traits::Objective,
            types::{Cost, Grad, Theta},
            validation::validate_grad,
        },
    },
    structured::StructuredValue,
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges an [`Objective`] to `argmin`'s `CostFunction` and `Gradient`.
///
/// `layout` fixes the keys and shapes used to unflatten `θ`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: Objective> {
    pub f: &'a F,
    pub data: &'a F::Data,
    pub layout: &'a StructuredValue,
}

impl<'a, F: Objective> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data, layout: &'a StructuredValue) -> Self {
        Self { f, data, layout }
    }

    /// Structured view of a flat parameter vector.
    pub fn unflatten(&self, theta: &Theta) -> OptResult<StructuredValue> {
        self.layout.unflatten_like(theta)
    }
}

impl<'a, F: Objective> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate `c(θ) = -f(x)`.
    ///
    /// # Errors
    /// - Propagates any `OptError` from the objective.
    /// - `NonFiniteCost` if the objective value is not finite.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let x = self.unflatten(theta)?;
        let output = self.f.value(&x, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output)
    }
}

impl<'a, F: Objective> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at `θ`.
    ///
    /// - With an analytic gradient: check it is co-indexed with the layout,
    ///   flatten, validate and return `-grad`.
    /// - Otherwise: central differences of the cost, retrying with forward
    ///   differences when a cost evaluation failed or the result is not
    ///   finite. The FD closure must return `f64`, so the first error is
    ///   parked in `closure_err` and `NaN` is returned in its place.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        let x = self.unflatten(theta)?;
        match self.f.grad(&x, self.data) {
            Ok(g) => {
                let g = self.layout.zip_with(&g, |_, v| v)?.flatten();
                validate_grad(&g, dim)?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_some() || validate_grad(&fd_grad, dim).is_err() {
                    return run_fd_diff(theta, &cost_func, &closure_err);
                }
                Ok(fd_grad)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Forward-difference gradient of `func` at `theta`, with error capture.
///
/// # Errors
/// Returns any error captured during evaluation of `func`, or the
/// validation error of the resulting gradient.
fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}
