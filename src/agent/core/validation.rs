//! Input validation for experience handed to the agent.
//!
//! Purpose
//! -------
//! Check raw experience against the agent's state and action specs before
//! anything reaches the model, naming the offending argument in every error.
//!
//! Key behaviors
//! -------------
//! - [`num_instances`] reads the leading length of the states.
//! - [`check_leading_len`] enforces a shared leading length per field
//!   (`len(actions[name])`, `len(terminal)`, ...).
//! - [`conform`] checks names and trailing shapes against specs and returns
//!   the collection in declaration order.
//! - [`validate_action_values`], [`validate_terminal`] and
//!   [`validate_reward`] check values: discrete actions integral and in
//!   range, terminal codes in `{0, 1, 2}`, rewards finite.
//!
//! Invariants & assumptions
//! ------------------------
//! - Validation never mutates its input.
//! - A collection returned by [`conform`] has exactly the spec names, in spec
//!   order, each with shape `[n] + spec.shape`.
use crate::{
    agent::{
        core::specs::{ActionSpec, StateSpec},
        errors::{AgentError, AgentResult},
    },
    structured::{Structured, StructuredValue, Tensor},
};
use ndarray::Array1;

/// Leading (time) length of `states`.
///
/// # Errors
/// - [`AgentError::MissingArgument`] if `states` is empty.
/// - [`AgentError::InvalidShape`] for a rank-0 state tensor.
/// - [`AgentError::LengthMismatch`] if the states disagree on their length.
pub fn num_instances(states: &StructuredValue) -> AgentResult<usize> {
    let Some((first_name, first)) = states.iter().next() else {
        return Err(AgentError::MissingArgument {
            name: "states".to_string(),
            condition: "experience is provided",
        });
    };
    let n = leading_len("states", first_name, first)?;
    check_leading_len(states, "states", n)?;
    Ok(n)
}

/// Every entry of `collection` has leading length `expected`.
///
/// # Errors
/// - [`AgentError::LengthMismatch`] naming `len(<field>[<name>])`.
/// - [`AgentError::InvalidShape`] for a rank-0 tensor.
pub fn check_leading_len(
    collection: &StructuredValue, field: &str, expected: usize,
) -> AgentResult<()> {
    for (name, tensor) in collection.iter() {
        let found = leading_len(field, name, tensor)?;
        if found != expected {
            return Err(AgentError::LengthMismatch {
                argument: format!("len({field}[{name}])"),
                expected,
                found,
            });
        }
    }
    Ok(())
}

/// Check `len(<argument>) == expected` for a flat array.
pub fn check_len(argument: &str, found: usize, expected: usize) -> AgentResult<()> {
    if found != expected {
        return Err(AgentError::LengthMismatch {
            argument: format!("len({argument})"),
            expected,
            found,
        });
    }
    Ok(())
}

/// Reorder `collection` into spec order, checking names and trailing shapes.
///
/// # Errors
/// - [`AgentError::MissingArgument`] for a spec without a matching entry.
/// - [`AgentError::InvalidArgument`] for an entry without a spec.
/// - [`AgentError::InvalidShape`] for a trailing-shape mismatch.
pub fn conform<'a, I>(
    collection: &StructuredValue, field: &str, specs: I,
) -> AgentResult<StructuredValue>
where
    I: IntoIterator<Item = (&'a str, &'a [usize])>,
{
    let mut out = Structured::new();
    for (name, shape) in specs {
        let tensor = collection.get(name).ok_or_else(|| AgentError::MissingArgument {
            name: format!("{field}[{name}]"),
            condition: "it is declared for the agent",
        })?;
        let found = tensor.shape().get(1..).unwrap_or(&[]);
        if tensor.ndim() == 0 || found != shape {
            return Err(AgentError::InvalidShape {
                name: format!("{field}[{name}]"),
                expected: shape.to_vec(),
                found: found.to_vec(),
            });
        }
        out.insert(name, tensor.clone())?;
    }
    if let Some(extra) = collection.names().iter().find(|name| !out.contains(name.as_str())) {
        return Err(AgentError::InvalidArgument {
            name: format!("{field}[{extra}]"),
            value: "present".to_string(),
            hint: "not declared for the agent",
        });
    }
    Ok(out)
}

/// [`conform`] for state or internal-state specs.
pub fn conform_states(
    collection: &StructuredValue, field: &str, specs: &[StateSpec],
) -> AgentResult<StructuredValue> {
    conform(collection, field, specs.iter().map(|s| (s.name.as_str(), s.shape.as_slice())))
}

/// [`conform`] for action specs.
pub fn conform_actions(
    collection: &StructuredValue, specs: &[ActionSpec],
) -> AgentResult<StructuredValue> {
    conform(collection, "actions", specs.iter().map(|s| (s.name.as_str(), s.shape.as_slice())))
}

/// Discrete actions are integral and in `[0, num_values)`; continuous
/// actions are finite.
///
/// # Errors
/// - [`AgentError::InvalidArgument`] naming the first offending action.
pub fn validate_action_values(
    actions: &StructuredValue, specs: &[ActionSpec],
) -> AgentResult<()> {
    for spec in specs {
        let Some(tensor) = actions.get(&spec.name) else { continue };
        let bad = match spec.num_values {
            Some(k) => tensor
                .iter()
                .find(|&&v| !(v.is_finite() && v.fract() == 0.0 && v >= 0.0 && v < k as f64)),
            None => tensor.iter().find(|v| !v.is_finite()),
        };
        if let Some(value) = bad {
            return Err(AgentError::InvalidArgument {
                name: format!("actions[{}]", spec.name),
                value: value.to_string(),
                hint: if spec.is_discrete() {
                    "not an integer in [0, num_values)"
                } else {
                    "not finite"
                },
            });
        }
    }
    Ok(())
}

/// Masks are 0/1 valued and allow every chosen discrete action.
///
/// `mask` has shape `[n] + spec.shape + [num_values]`; `action` has shape
/// `[n] + spec.shape` with values already checked by
/// [`validate_action_values`].
pub fn validate_mask(spec: &ActionSpec, mask: &Tensor, action: &Tensor) -> AgentResult<()> {
    if let Some(value) = mask.iter().find(|&&v| v != 0.0 && v != 1.0) {
        return Err(AgentError::InvalidArgument {
            name: spec.mask_state_name(),
            value: value.to_string(),
            hint: "not in {0, 1}",
        });
    }
    let num_values = spec.num_values.unwrap_or(1);
    let flat_mask: Vec<f64> = mask.iter().copied().collect();
    for (index, choice) in action.iter().enumerate() {
        let allowed =
            flat_mask.get(index * num_values + *choice as usize).copied().unwrap_or(0.0);
        if allowed == 0.0 {
            return Err(AgentError::InvalidArgument {
                name: format!("actions[{}]", spec.name),
                value: choice.to_string(),
                hint: "masked out",
            });
        }
    }
    Ok(())
}

/// Terminal codes are 0 (continue), 1 (terminal) or 2 (aborted).
pub fn validate_terminal(terminal: &Array1<i64>) -> AgentResult<()> {
    if let Some(code) = terminal.iter().find(|code| !(0..=2).contains(*code)) {
        return Err(AgentError::InvalidArgument {
            name: "terminal".to_string(),
            value: code.to_string(),
            hint: "not in {0, 1, 2}",
        });
    }
    Ok(())
}

pub fn validate_reward(reward: &Array1<f64>) -> AgentResult<()> {
    if let Some(value) = reward.iter().find(|v| !v.is_finite()) {
        return Err(AgentError::InvalidArgument {
            name: "reward".to_string(),
            value: value.to_string(),
            hint: "not finite",
        });
    }
    Ok(())
}

fn leading_len(field: &str, name: &str, tensor: &Tensor) -> AgentResult<usize> {
    tensor.shape().first().copied().ok_or_else(|| AgentError::InvalidShape {
        name: format!("{field}[{name}]"),
        expected: vec![1],
        found: Vec::new(),
    })
}
