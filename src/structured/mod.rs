//! structured — ordered named collections of tensors.
//!
//! Purpose
//! -------
//! Everything the optimizer moves around (points, step deltas, gradients) and
//! everything the agent ingests (states, actions, auxiliaries) is a set of
//! named tensors with a fixed key order. This module provides the generic
//! container, its tensor algebra and its serde representation.
//!
//! Key behaviors
//! -------------
//! - [`Structured<T>`]: insertion-ordered `name -> T` map with one- and
//!   many-operand element-wise maps that fail fast on key mismatches.
//! - [`StructuredValue`]: `Structured<ArrayD<f64>>` with shape-checked
//!   arithmetic, inner products and flatten/unflatten for argmin.
//! - Serialization as an ordered map.
//!
//! Downstream usage
//! ----------------
//! - `optimization::solvers` consumes [`StructuredValue`] for `x` and deltas.
//! - `agent` stores experience batches as `Structured<ArrayD<f64>>`.
pub mod container;
pub mod serde_impl;
pub mod tensor;

pub use self::container::Structured;
pub use self::tensor::{StructuredValue, Tensor};

pub mod prelude {
    pub use super::container::Structured;
    pub use super::tensor::{StructuredValue, Tensor};
}
