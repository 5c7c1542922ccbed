//! Tensor arithmetic over structured collections.
//!
//! Purpose
//! -------
//! Implement the element-wise algebra the line-search solver and the step
//! optimizer need on [`StructuredValue`]: scaling, addition, subtraction,
//! inner products and flattening into the contiguous vectors argmin works
//! with. Row-wise slicing and concatenation serve the experience pipeline.
//!
//! Invariants & assumptions
//! ------------------------
//! - Binary operations require identical key sequences *and* identical shapes
//!   per key; violations surface as [`OptError::StructureMismatch`] or
//!   [`OptError::ShapeMismatch`].
//! - Flattening walks keys in order and each tensor in logical (row-major)
//!   order; [`StructuredValue::unflatten_like`] is its exact inverse for the
//!   same layout.
//!
//! Conventions
//! -----------
//! - Row operations treat axis 0 as the batch (time) axis.
use crate::{
    optimization::errors::{OptError, OptResult},
    structured::container::Structured,
};
use ndarray::{concatenate, Array1, ArrayD, ArrayView, Axis, IxDyn, Slice};
use std::ops::Range;

/// Dense `f64` tensor of arbitrary rank.
pub type Tensor = ArrayD<f64>;

/// Ordered `name -> tensor` mapping used for points, deltas and gradients.
pub type StructuredValue = Structured<Tensor>;

impl StructuredValue {
    /// Same keys and shapes, every element zero.
    pub fn zeros_like(&self) -> Self {
        self.map(|tensor| Tensor::zeros(tensor.raw_dim()))
    }

    /// Multiply every element by `factor`.
    pub fn scale(&self, factor: f64) -> Self {
        self.map(|tensor| tensor * factor)
    }

    pub fn neg(&self) -> Self {
        self.scale(-1.0)
    }

    /// Element-wise sum.
    ///
    /// # Errors
    /// - [`OptError::StructureMismatch`] / [`OptError::ShapeMismatch`].
    pub fn try_add(&self, other: &Self) -> OptResult<Self> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Element-wise difference `self - other`.
    ///
    /// # Errors
    /// - [`OptError::StructureMismatch`] / [`OptError::ShapeMismatch`].
    pub fn try_sub(&self, other: &Self) -> OptResult<Self> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Apply a scalar binary function to every aligned pair of elements.
    pub fn zip_with<F>(&self, other: &Self, f: F) -> OptResult<Self>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_shapes(other)?;
        self.zip_map(other, |a, b| {
            let mut out = a.clone();
            out.zip_mut_with(b, |x, &y| *x = f(*x, y));
            out
        })
    }

    /// Sum over all keys of the element-wise products.
    pub fn dot(&self, other: &Self) -> OptResult<f64> {
        self.check_shapes(other)?;
        Ok(self.values().iter().zip(other.values()).map(|(a, b)| (a * b).sum()).sum())
    }

    pub fn l2_norm(&self) -> f64 {
        self.values().iter().map(|t| t.iter().map(|x| x * x).sum::<f64>()).sum::<f64>().sqrt()
    }

    /// Total number of scalar elements across all keys.
    pub fn num_elements(&self) -> usize {
        self.values().iter().map(|t| t.len()).sum()
    }

    pub fn is_finite(&self) -> bool {
        self.values().iter().all(|t| t.iter().all(|x| x.is_finite()))
    }

    /// Concatenate every tensor, in key order, into one flat vector.
    pub fn flatten(&self) -> Array1<f64> {
        let mut flat = Vec::with_capacity(self.num_elements());
        for tensor in self.values() {
            flat.extend(tensor.iter().copied());
        }
        Array1::from_vec(flat)
    }

    /// Rebuild a structured value with the keys and shapes of `self` from a
    /// flat vector produced by [`StructuredValue::flatten`].
    ///
    /// # Errors
    /// - [`OptError::LayoutMismatch`] if `flat` has the wrong length.
    pub fn unflatten_like(&self, flat: &Array1<f64>) -> OptResult<Self> {
        let expected = self.num_elements();
        if flat.len() != expected {
            return Err(OptError::LayoutMismatch { expected, found: flat.len() });
        }
        let mut offset = 0;
        self.try_map(|_, tensor| {
            let end = offset + tensor.len();
            let chunk = flat.slice(ndarray::s![offset..end]).to_vec();
            offset = end;
            ArrayD::from_shape_vec(tensor.raw_dim(), chunk)
                .map_err(|_| OptError::LayoutMismatch { expected, found: flat.len() })
        })
    }

    fn check_shapes(&self, other: &Self) -> OptResult<()> {
        self.check_keys(other)?;
        for ((name, a), b) in self.iter().zip(other.values()) {
            if a.shape() != b.shape() {
                return Err(OptError::ShapeMismatch {
                    name: name.to_string(),
                    expected: a.shape().to_vec(),
                    found: b.shape().to_vec(),
                });
            }
        }
        Ok(())
    }
}

impl<A: Clone> Structured<ArrayD<A>> {
    /// Leading-axis length shared by every entry, `None` when empty or ragged.
    pub fn leading_len(&self) -> Option<usize> {
        let mut lens = self.values().iter().map(|t| t.shape().first().copied().unwrap_or(0));
        let first = lens.next()?;
        lens.all(|len| len == first).then_some(first)
    }

    /// Rows `range` of every entry, along axis 0.
    pub fn slice_rows(&self, range: Range<usize>) -> Self {
        self.map(|tensor| {
            tensor.slice_axis(Axis(0), Slice::from(range.start..range.end)).to_owned()
        })
    }

    /// Stack co-indexed collections along axis 0.
    ///
    /// # Errors
    /// - [`OptError::StructureMismatch`] if keys differ between parts.
    /// - [`OptError::ShapeMismatch`] if trailing dimensions differ for a key.
    pub fn concat_rows(parts: &[&Self]) -> OptResult<Self> {
        let Some((first, rest)) = parts.split_first() else {
            return Ok(Self::new());
        };
        for part in rest {
            first.check_keys(part)?;
            for ((name, a), b) in first.iter().zip(part.values()) {
                if a.ndim() == 0 || a.ndim() != b.ndim() || a.shape()[1..] != b.shape()[1..] {
                    return Err(OptError::ShapeMismatch {
                        name: name.to_string(),
                        expected: a.shape().to_vec(),
                        found: b.shape().to_vec(),
                    });
                }
            }
        }
        let stacked = first.zip_map_all(rest, |tensors| {
            let views: Vec<ArrayView<'_, A, IxDyn>> = tensors.iter().map(|t| t.view()).collect();
            concatenate(Axis(0), &views)
        })?;
        let mut out = Self::new();
        for (name, tensor) in stacked.into_pairs() {
            let tensor = tensor.map_err(|_| OptError::ShapeMismatch {
                name: name.clone(),
                expected: Vec::new(),
                found: Vec::new(),
            })?;
            out.insert(name, tensor)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, IxDyn};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Shape-checked arithmetic (add / sub / dot).
    // - flatten / unflatten_like layout inverse.
    // - Row slicing and concatenation for experience batches.
    // -------------------------------------------------------------------------

    fn point() -> StructuredValue {
        Structured::from_pairs([
            ("w", array![[1.0, 2.0], [3.0, 4.0]].into_dyn()),
            ("b", array![5.0].into_dyn()),
        ])
        .expect("unique")
    }

    #[test]
    // Purpose
    // -------
    // Adding the negation of a value yields zeros.
    fn try_add_with_negation_is_zero() {
        let x = point();

        let sum = x.try_add(&x.neg()).expect("same layout");

        assert_eq!(sum, x.zeros_like());
    }

    #[test]
    // Purpose
    // -------
    // Arithmetic refuses tensors of different shapes under the same key.
    fn try_sub_rejects_shape_mismatch() {
        let x = point();
        let y = Structured::from_pairs([
            ("w", array![1.0, 2.0].into_dyn()),
            ("b", array![5.0].into_dyn()),
        ])
        .expect("unique");

        let result = x.try_sub(&y);

        assert_eq!(
            result,
            Err(OptError::ShapeMismatch {
                name: "w".to_string(),
                expected: vec![2, 2],
                found: vec![2],
            })
        );
    }

    #[test]
    // Purpose
    // -------
    // `dot` sums products across every key.
    fn dot_sums_over_keys() {
        let x = point();

        let value = x.dot(&x).expect("same layout");

        assert_abs_diff_eq!(value, 1.0 + 4.0 + 9.0 + 16.0 + 25.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x.l2_norm(), value.sqrt(), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // `unflatten_like` restores keys and shapes, and rejects a wrong length.
    fn unflatten_like_restores_layout() {
        let x = point();
        let flat = x.flatten();

        let restored = x.unflatten_like(&flat).expect("same length");
        let short = x.unflatten_like(&Array1::zeros(3));

        assert_eq!(flat.to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(restored, x);
        assert_eq!(short, Err(OptError::LayoutMismatch { expected: 5, found: 3 }));
    }

    #[test]
    // Purpose
    // -------
    // Row slicing and concatenation operate along the leading axis and keep
    // trailing shapes intact.
    fn slice_and_concat_rows_preserve_trailing_shape() {
        let batch = Structured::from_pairs([
            ("obs", ArrayD::from_shape_fn(IxDyn(&[4, 2]), |ix| (ix[0] * 2 + ix[1]) as f64)),
            ("act", array![0.0, 1.0, 0.0, 1.0].into_dyn()),
        ])
        .expect("unique");

        let head = batch.slice_rows(0..1);
        let tail = batch.slice_rows(1..4);
        let joined = Structured::concat_rows(&[&head, &tail]).expect("compatible");

        assert_eq!(head.leading_len(), Some(1));
        assert_eq!(tail.get("obs").map(|t| t.shape().to_vec()), Some(vec![3, 2]));
        assert_eq!(joined, batch);
    }

    #[test]
    // Purpose
    // -------
    // Concatenating parts whose trailing dimensions differ fails with the
    // offending key.
    fn concat_rows_rejects_trailing_mismatch() {
        let a = Structured::from_pairs([("obs", ArrayD::<f64>::zeros(IxDyn(&[2, 3])))])
            .expect("unique");
        let b = Structured::from_pairs([("obs", ArrayD::<f64>::zeros(IxDyn(&[2, 4])))])
            .expect("unique");

        let result = Structured::concat_rows(&[&a, &b]);

        assert!(matches!(result, Err(OptError::ShapeMismatch { ref name, .. }) if name == "obs"));
    }
}
