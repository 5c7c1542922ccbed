//! Experience batches and the batch-splitting rule.
//!
//! Purpose
//! -------
//! Define the tensor form in which experience travels from the agent to the
//! model ([`ExperienceBatch`]), the raw input accepted by the agent
//! ([`ExperienceInput`]), and the rule that cuts a long run of timesteps into
//! model-sized pieces ([`batch_ranges`]).
//!
//! Key behaviors
//! -------------
//! - Terminal flags are integer codes: 0 = not terminal, 1 = terminal,
//!   2 = aborted. Boolean flags convert to 0/1 ([`Terminal`]).
//! - [`batch_ranges`] scans terminal flags left to right and closes the open
//!   batch at a terminal step (inclusive) or once it holds `experience_size`
//!   steps; a trailing remainder becomes the last batch.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every tensor of a batch shares the leading (time) length of `reward`.
//! - Ranges returned by [`batch_ranges`] are contiguous, non-empty, cover
//!   `0..len` exactly and are at most `experience_size` long.
//!
//! Conventions
//! -----------
//! - Batches serialize through serde; this is the trace-file format.
use crate::{optimization::errors::OptResult, structured::StructuredValue};
use ndarray::{concatenate, s, Array1, Axis};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Terminal flags as accepted from callers.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    Flags(Array1<bool>),
    Codes(Array1<i64>),
}

impl Terminal {
    pub fn len(&self) -> usize {
        match self {
            Terminal::Flags(flags) => flags.len(),
            Terminal::Codes(codes) => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Integer codes; `true` maps to 1.
    pub fn into_codes(self) -> Array1<i64> {
        match self {
            Terminal::Flags(flags) => flags.mapv(i64::from),
            Terminal::Codes(codes) => codes,
        }
    }
}

impl From<Array1<bool>> for Terminal {
    fn from(flags: Array1<bool>) -> Self {
        Terminal::Flags(flags)
    }
}

impl From<Array1<i64>> for Terminal {
    fn from(codes: Array1<i64>) -> Self {
        Terminal::Codes(codes)
    }
}

/// Raw experience handed to `Agent::experience`.
///
/// Every array carries a leading time axis. Masks for discrete actions may be
/// passed as states named `<action>_mask`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceInput {
    pub states: StructuredValue,
    pub actions: StructuredValue,
    pub terminal: Terminal,
    pub reward: Array1<f64>,
    pub internals: Option<StructuredValue>,
}

impl ExperienceInput {
    pub fn new(
        states: StructuredValue, actions: StructuredValue, terminal: impl Into<Terminal>,
        reward: Array1<f64>,
    ) -> Self {
        Self { states, actions, terminal: terminal.into(), reward, internals: None }
    }

    pub fn with_internals(mut self, internals: StructuredValue) -> Self {
        self.internals = Some(internals);
        self
    }
}

/// Validated experience in model-ready tensor form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceBatch {
    pub states: StructuredValue,
    pub internals: StructuredValue,
    /// Per-action auxiliary tensors, named `<action>/mask`.
    pub auxiliaries: StructuredValue,
    pub actions: StructuredValue,
    pub terminal: Array1<i64>,
    pub reward: Array1<f64>,
}

impl ExperienceBatch {
    /// Number of timesteps.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    /// Number of timesteps that end an episode (terminal code > 0).
    pub fn num_episodes(&self) -> usize {
        self.terminal.iter().filter(|&&code| code > 0).count()
    }

    /// Timesteps `range` of every field.
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            states: self.states.slice_rows(range.clone()),
            internals: self.internals.slice_rows(range.clone()),
            auxiliaries: self.auxiliaries.slice_rows(range.clone()),
            actions: self.actions.slice_rows(range.clone()),
            terminal: self.terminal.slice(s![range.clone()]).to_owned(),
            reward: self.reward.slice(s![range]).to_owned(),
        }
    }

    /// Concatenate batches along the time axis.
    ///
    /// # Errors
    /// - [`OptError::StructureMismatch`] / [`OptError::ShapeMismatch`] when a
    ///   key set or a trailing shape differs between parts.
    ///
    /// [`OptError::StructureMismatch`]: crate::optimization::errors::OptError::StructureMismatch
    /// [`OptError::ShapeMismatch`]: crate::optimization::errors::OptError::ShapeMismatch
    pub fn concat(parts: &[&Self]) -> OptResult<Self> {
        let states: Vec<&StructuredValue> = parts.iter().map(|b| &b.states).collect();
        let internals: Vec<&StructuredValue> = parts.iter().map(|b| &b.internals).collect();
        let auxiliaries: Vec<&StructuredValue> = parts.iter().map(|b| &b.auxiliaries).collect();
        let actions: Vec<&StructuredValue> = parts.iter().map(|b| &b.actions).collect();
        let terminal: Vec<_> = parts.iter().map(|b| b.terminal.view()).collect();
        let reward: Vec<_> = parts.iter().map(|b| b.reward.view()).collect();
        Ok(Self {
            states: StructuredValue::concat_rows(&states)?,
            internals: StructuredValue::concat_rows(&internals)?,
            auxiliaries: StructuredValue::concat_rows(&auxiliaries)?,
            actions: StructuredValue::concat_rows(&actions)?,
            terminal: concatenate(Axis(0), &terminal).unwrap_or_else(|_| Array1::zeros(0)),
            reward: concatenate(Axis(0), &reward).unwrap_or_else(|_| Array1::zeros(0)),
        })
    }
}

/// Cut `0..terminal.len()` into batches.
///
/// A batch closes right after a terminal step or once it spans
/// `experience_size` steps (treated as at least 1); the remainder after the
/// last cut forms a final batch.
pub fn batch_ranges(terminal: &[i64], experience_size: usize) -> Vec<Range<usize>> {
    let size = experience_size.max(1);
    let mut ranges = Vec::new();
    let mut last = 0;
    for index in 1..=terminal.len() {
        if terminal[index - 1] == 0 && index - last < size {
            continue;
        }
        ranges.push(last..index);
        last = index;
    }
    if last < terminal.len() {
        ranges.push(last..terminal.len());
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::Structured;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Batch boundaries at terminals and at capacity, remainder flushing.
    // - Terminal conversion, slicing and concatenation of batches.
    // -------------------------------------------------------------------------

    fn batch(rewards: Array1<f64>, terminal: Array1<i64>) -> ExperienceBatch {
        let n = rewards.len();
        let states = Structured::from_pairs([(
            "s",
            Array1::from_iter((0..n).map(|i| i as f64)).into_dyn(),
        )])
        .expect("unique");
        let actions = Structured::from_pairs([("a", Array1::<f64>::zeros(n).into_dyn())])
            .expect("unique");
        ExperienceBatch {
            states,
            internals: Structured::new(),
            auxiliaries: Structured::new(),
            actions,
            terminal,
            reward: rewards,
        }
    }

    #[test]
    // Purpose
    // -------
    // A terminal closes its batch; capacity and the end of input close the
    // rest.
    //
    // Given
    // -----
    // - terminal = [0, 0, 1, 0, 0, 0], experience_size = 4.
    //
    // Expect
    // ------
    // - [0..3] (terminal included) and [3..6].
    fn ranges_split_at_terminal_then_flush() {
        let ranges = batch_ranges(&[0, 0, 1, 0, 0, 0], 4);

        assert_eq!(ranges, vec![0..3, 3..6]);
    }

    #[test]
    // Purpose
    // -------
    // Without terminals, batches are cut at capacity.
    fn ranges_split_at_capacity() {
        let ranges = batch_ranges(&[0, 0, 0, 0, 0, 0, 0], 3);

        assert_eq!(ranges, vec![0..3, 3..6, 6..7]);
    }

    #[test]
    // Purpose
    // -------
    // Aborted episodes (code 2) also close a batch; empty input yields none.
    fn ranges_handle_abort_and_empty_input() {
        assert_eq!(batch_ranges(&[2, 0, 1], 10), vec![0..1, 1..3]);
        assert!(batch_ranges(&[], 4).is_empty());
    }

    #[test]
    // Purpose
    // -------
    // Boolean flags become 0/1 codes.
    fn terminal_flags_convert_to_codes() {
        let terminal = Terminal::from(array![false, true, false]);

        assert_eq!(terminal.len(), 3);
        assert_eq!(terminal.into_codes(), array![0, 1, 0]);
    }

    #[test]
    // Purpose
    // -------
    // Slicing then concatenating restores the batch.
    fn slice_and_concat_restore_batch() {
        let full = batch(array![1.0, 2.0, 3.0, 4.0], array![0, 1, 0, 1]);

        let head = full.slice(0..2);
        let tail = full.slice(2..4);
        let joined = ExperienceBatch::concat(&[&head, &tail]).expect("concat");

        assert_eq!(head.len(), 2);
        assert_eq!(head.num_episodes(), 1);
        assert_eq!(joined, full);
    }

    #[test]
    // Purpose
    // -------
    // Batches whose states disagree in name cannot be concatenated.
    fn concat_rejects_mismatched_states() {
        let a = batch(array![1.0], array![0]);
        let mut b = batch(array![2.0], array![1]);
        b.states = Structured::from_pairs([("other", array![0.0].into_dyn())]).expect("unique");

        assert!(ExperienceBatch::concat(&[&a, &b]).is_err());
    }
}
