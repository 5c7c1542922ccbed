//! Importance-weighted surrogate objective of a linear softmax policy.
//!
//! Purpose
//! -------
//! Provide the [`Objective`] the policy-gradient model hands to the
//! line-search step optimizer:
//!
//! `L(θ) = mean_i( π_θ(a_i | s_i) / π_old(a_i | s_i) · A_i ) - l2 / 2 · |θ|²`
//!
//! with `π_θ(· | s) = softmax(s W + b)` restricted to unmasked actions.
//!
//! Key behaviors
//! -------------
//! - [`policy_probabilities`] evaluates the masked softmax for a batch.
//! - The analytic gradient is
//!   `G_ij = A_i / n · r_i · (1[j = a_i] - π_ij)`, `∇W = Sᵀ G - l2 W`,
//!   `∇b = Σ_i G_i - l2 b`, returned in parameter order.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameters are `{weights: [d, k], bias: [k]}` in that order.
//! - Masks are 0/1 with the chosen action always allowed; masked logits are
//!   set to `-inf` and receive zero probability.
//! - Old probabilities are floored at `EPSILON` in the ratio.
use crate::{
    optimization::{
        errors::{OptError, OptResult},
        numerical_stability::{floored_ratio, safe_softmax_rows},
        proposal::Objective,
    },
    structured::{Structured, StructuredValue},
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Ix1, Ix2};

pub const WEIGHTS: &str = "weights";
pub const BIAS: &str = "bias";

/// Zero-initialized parameters for `num_features` inputs and `num_actions`
/// choices.
pub fn initial_parameters(num_features: usize, num_actions: usize) -> OptResult<StructuredValue> {
    Structured::from_pairs([
        (WEIGHTS, Array2::<f64>::zeros((num_features, num_actions)).into_dyn()),
        (BIAS, Array1::<f64>::zeros(num_actions).into_dyn()),
    ])
}

/// Fixed inputs of one surrogate optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct SurrogateData {
    /// `[n, d]` state features.
    pub features: Array2<f64>,
    /// Chosen action per row.
    pub actions: Vec<usize>,
    /// `[n, k]` action masks.
    pub masks: Array2<f64>,
    pub advantages: Array1<f64>,
    /// Probability of the chosen action under the pre-update policy.
    pub old_probabilities: Array1<f64>,
    pub l2_regularization: f64,
}

/// Surrogate objective; all inputs live in [`SurrogateData`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Surrogate;

/// Masked softmax probabilities `[n, k]`.
///
/// # Errors
/// - [`OptError::MissingName`] if a parameter is absent.
/// - [`OptError::ShapeMismatch`] if parameter, feature or mask shapes are
///   inconsistent.
pub fn policy_probabilities(
    params: &StructuredValue, features: ArrayView2<'_, f64>, masks: ArrayView2<'_, f64>,
) -> OptResult<Array2<f64>> {
    let (weights, bias) = split_parameters(params)?;
    if weights.nrows() != features.ncols() {
        return Err(OptError::ShapeMismatch {
            name: "features".to_string(),
            expected: vec![features.nrows(), weights.nrows()],
            found: features.shape().to_vec(),
        });
    }
    let mut logits = features.dot(&weights) + &bias;
    if masks.shape() != logits.shape() {
        return Err(OptError::ShapeMismatch {
            name: "masks".to_string(),
            expected: logits.shape().to_vec(),
            found: masks.shape().to_vec(),
        });
    }
    logits.zip_mut_with(&masks, |logit, &allowed| {
        if allowed == 0.0 {
            *logit = f64::NEG_INFINITY;
        }
    });
    Ok(safe_softmax_rows(logits.view()))
}

fn split_parameters(
    params: &StructuredValue,
) -> OptResult<(ArrayView2<'_, f64>, ArrayView1<'_, f64>)> {
    let weights = params.require(WEIGHTS)?;
    let bias = params.require(BIAS)?;
    let weights = weights.view().into_dimensionality::<Ix2>().map_err(|_| {
        OptError::ShapeMismatch {
            name: WEIGHTS.to_string(),
            expected: vec![0, 0],
            found: weights.shape().to_vec(),
        }
    })?;
    let bias = bias.view().into_dimensionality::<Ix1>().map_err(|_| OptError::ShapeMismatch {
        name: BIAS.to_string(),
        expected: vec![weights.ncols()],
        found: bias.shape().to_vec(),
    })?;
    if bias.len() != weights.ncols() {
        return Err(OptError::ShapeMismatch {
            name: BIAS.to_string(),
            expected: vec![weights.ncols()],
            found: vec![bias.len()],
        });
    }
    Ok((weights, bias))
}

fn ratios(probabilities: &Array2<f64>, data: &SurrogateData) -> Array1<f64> {
    data.actions
        .iter()
        .zip(&data.old_probabilities)
        .enumerate()
        .map(|(i, (&action, &old))| floored_ratio(probabilities[[i, action]], old))
        .collect()
}

impl Objective for Surrogate {
    type Data = SurrogateData;

    fn value(&self, x: &StructuredValue, data: &SurrogateData) -> OptResult<f64> {
        let probabilities = policy_probabilities(x, data.features.view(), data.masks.view())?;
        let ratios = ratios(&probabilities, data);
        let n = data.actions.len().max(1) as f64;
        let surrogate = ratios.dot(&data.advantages) / n;
        let penalty = 0.5 * data.l2_regularization * x.dot(x)?;
        Ok(surrogate - penalty)
    }

    fn check(&self, x: &StructuredValue, data: &SurrogateData) -> OptResult<()> {
        let (weights, _) = split_parameters(x)?;
        let n = data.features.nrows();
        for (name, len) in [
            ("actions", data.actions.len()),
            ("masks", data.masks.nrows()),
            ("advantages", data.advantages.len()),
            ("old_probabilities", data.old_probabilities.len()),
        ] {
            if len != n {
                return Err(OptError::ShapeMismatch {
                    name: name.to_string(),
                    expected: vec![n],
                    found: vec![len],
                });
            }
        }
        if let Some(&action) = data.actions.iter().find(|&&a| a >= weights.ncols()) {
            return Err(OptError::ShapeMismatch {
                name: "actions".to_string(),
                expected: vec![weights.ncols()],
                found: vec![action],
            });
        }
        Ok(())
    }

    fn grad(&self, x: &StructuredValue, data: &SurrogateData) -> OptResult<StructuredValue> {
        let (weights, bias) = split_parameters(x)?;
        let probabilities = policy_probabilities(x, data.features.view(), data.masks.view())?;
        let ratios = ratios(&probabilities, data);
        let n = data.actions.len().max(1) as f64;

        let mut g = -probabilities;
        for (i, mut row) in g.axis_iter_mut(Axis(0)).enumerate() {
            row[data.actions[i]] += 1.0;
            let scale = data.advantages[i] * ratios[i] / n;
            row.mapv_inplace(|v| v * scale);
        }
        let l2 = data.l2_regularization;
        let grad_weights = data.features.t().dot(&g) - &(&weights * l2);
        let grad_bias = g.sum_axis(Axis(0)) - &(&bias * l2);

        let mut grad = Structured::new();
        grad.insert(WEIGHTS, grad_weights.into_dyn())?;
        grad.insert(BIAS, grad_bias.into_dyn())?;
        Ok(grad)
    }
}
