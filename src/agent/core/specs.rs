//! State, internal-state and action specifications.
//!
//! A spec fixes the name and the per-timestep (trailing) shape of one input.
//! Experience tensors carry an extra leading time axis on top of that shape.
//! Discrete actions additionally declare `num_values`; their values are
//! stored as integral `f64` in `[0, num_values)`, and each discrete action
//! owns an auxiliary mask of shape `shape + [num_values]`.
use crate::agent::errors::{AgentError, AgentResult};

/// Name and trailing shape of a state or internal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSpec {
    pub name: String,
    pub shape: Vec<usize>,
}

impl StateSpec {
    /// # Errors
    /// - [`AgentError::InvalidArgument`] for an empty name or a zero-sized
    ///   dimension.
    pub fn new(name: impl Into<String>, shape: Vec<usize>) -> AgentResult<Self> {
        let name = name.into();
        validate_name_and_shape(&name, &shape)?;
        Ok(Self { name, shape })
    }
}

/// Name, trailing shape and (for discrete actions) number of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    pub name: String,
    pub shape: Vec<usize>,
    /// `Some(k)` for discrete actions taking values in `[0, k)`.
    pub num_values: Option<usize>,
}

impl ActionSpec {
    /// Discrete action with `num_values` choices.
    ///
    /// # Errors
    /// - [`AgentError::InvalidArgument`] for an empty name, a zero-sized
    ///   dimension or `num_values < 2`.
    pub fn discrete(
        name: impl Into<String>, shape: Vec<usize>, num_values: usize,
    ) -> AgentResult<Self> {
        let name = name.into();
        validate_name_and_shape(&name, &shape)?;
        if num_values < 2 {
            return Err(AgentError::InvalidArgument {
                name: format!("actions[{name}].num_values"),
                value: num_values.to_string(),
                hint: "< 2",
            });
        }
        Ok(Self { name, shape, num_values: Some(num_values) })
    }

    /// Continuous (real-valued) action.
    pub fn continuous(name: impl Into<String>, shape: Vec<usize>) -> AgentResult<Self> {
        let name = name.into();
        validate_name_and_shape(&name, &shape)?;
        Ok(Self { name, shape, num_values: None })
    }

    pub fn is_discrete(&self) -> bool {
        self.num_values.is_some()
    }

    /// Name of the state entry that may carry this action's mask.
    pub fn mask_state_name(&self) -> String {
        format!("{}_mask", self.name)
    }

    /// Name of the auxiliary entry holding this action's mask.
    pub fn mask_auxiliary_name(&self) -> String {
        format!("{}/mask", self.name)
    }

    /// Trailing shape of the mask, `None` for continuous actions.
    pub fn mask_shape(&self) -> Option<Vec<usize>> {
        self.num_values.map(|k| {
            let mut shape = self.shape.clone();
            shape.push(k);
            shape
        })
    }
}

fn validate_name_and_shape(name: &str, shape: &[usize]) -> AgentResult<()> {
    if name.is_empty() {
        return Err(AgentError::InvalidArgument {
            name: "name".to_string(),
            value: String::new(),
            hint: "is empty",
        });
    }
    if shape.contains(&0) {
        return Err(AgentError::InvalidArgument {
            name: format!("{name}.shape"),
            value: format!("{shape:?}"),
            hint: "contains a zero-sized dimension",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Discrete actions derive mask names and shapes from their spec.
    fn discrete_action_mask_layout() {
        let spec = ActionSpec::discrete("move", vec![2], 3).expect("valid");

        assert_eq!(spec.mask_state_name(), "move_mask");
        assert_eq!(spec.mask_auxiliary_name(), "move/mask");
        assert_eq!(spec.mask_shape(), Some(vec![2, 3]));
    }

    #[test]
    // Purpose
    // -------
    // Degenerate specs are rejected at construction.
    fn invalid_specs_are_rejected() {
        assert!(ActionSpec::discrete("a", vec![], 1).is_err());
        assert!(StateSpec::new("", vec![3]).is_err());
        assert!(StateSpec::new("s", vec![3, 0]).is_err());
        assert!(ActionSpec::continuous("c", vec![]).expect("valid").mask_shape().is_none());
    }
}
