//! Per-slot buffers for step-by-step interaction.
//!
//! Purpose
//! -------
//! Hold the timesteps of each parallel interaction slot until they are ready
//! to be ingested: a slot flushes when it records a terminal step or once it
//! holds `capacity` timesteps.
//!
//! Invariants & assumptions
//! ------------------------
//! - Slots never share records; a flush drains exactly one slot.
//! - A failed flush leaves its slot as it was.
//! - Records of one slot share state/action names and per-step shapes;
//!   violations surface when the slot is stacked.
//!
//! Conventions
//! -----------
//! - A [`TimestepRecord`] holds per-step tensors without the time axis;
//!   stacking adds it.
use crate::{
    agent::{
        core::batch::{ExperienceInput, Terminal},
        errors::{AgentError, AgentResult},
    },
    structured::StructuredValue,
};
use ndarray::{Array1, Axis};

/// One observed timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestepRecord {
    pub states: StructuredValue,
    pub actions: StructuredValue,
    pub internals: Option<StructuredValue>,
    /// Terminal code (0, 1 or 2).
    pub terminal: i64,
    pub reward: f64,
}

impl TimestepRecord {
    pub fn new(
        states: StructuredValue, actions: StructuredValue, terminal: bool, reward: f64,
    ) -> Self {
        Self { states, actions, internals: None, terminal: i64::from(terminal), reward }
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal > 0
    }

    /// This record alone as a one-step experience input.
    pub fn to_input(&self) -> AgentResult<ExperienceInput> {
        stack(std::slice::from_ref(self))
    }
}

/// Buffers of all parallel interaction slots.
#[derive(Debug, Clone)]
pub struct InteractionBuffers {
    slots: Vec<Vec<TimestepRecord>>,
    capacity: usize,
}

impl InteractionBuffers {
    /// `capacity` is treated as at least 1.
    pub fn new(parallel_interactions: usize, capacity: usize) -> Self {
        Self { slots: vec![Vec::new(); parallel_interactions], capacity: capacity.max(1) }
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered timesteps in slot `parallel`.
    pub fn slot_len(&self, parallel: usize) -> AgentResult<usize> {
        Ok(self.slot(parallel)?.len())
    }

    /// `true` when no slot holds a timestep.
    pub fn is_idle(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }

    /// Buffer `record` in slot `parallel`; return the slot's stacked
    /// experience when it flushes.
    ///
    /// # Errors
    /// - [`AgentError::InvalidParallel`] for an unknown slot.
    /// - Stacking errors when the slot's records disagree in structure; the
    ///   record is then dropped and the earlier records stay buffered.
    pub fn push(
        &mut self, parallel: usize, record: TimestepRecord,
    ) -> AgentResult<Option<ExperienceInput>> {
        let capacity = self.capacity;
        let slot = self.slot_mut(parallel)?;
        let terminal = record.is_terminal();
        slot.push(record);
        if terminal || slot.len() >= capacity {
            let flushed = self.flush(parallel);
            if flushed.is_err() {
                self.slot_mut(parallel)?.pop();
            }
            return flushed;
        }
        Ok(None)
    }

    /// Drain slot `parallel`, `None` when it is empty. The slot is left
    /// untouched when stacking fails.
    pub fn flush(&mut self, parallel: usize) -> AgentResult<Option<ExperienceInput>> {
        let slot = self.slot_mut(parallel)?;
        if slot.is_empty() {
            return Ok(None);
        }
        let input = stack(slot.as_slice())?;
        slot.clear();
        Ok(Some(input))
    }

    /// Drop every buffered timestep.
    pub fn reset(&mut self) {
        self.slots.iter_mut().for_each(Vec::clear);
    }

    fn slot(&self, parallel: usize) -> AgentResult<&Vec<TimestepRecord>> {
        let parallel_interactions = self.slots.len();
        self.slots.get(parallel).ok_or(AgentError::InvalidParallel { parallel, parallel_interactions })
    }

    fn slot_mut(&mut self, parallel: usize) -> AgentResult<&mut Vec<TimestepRecord>> {
        let parallel_interactions = self.slots.len();
        self.slots
            .get_mut(parallel)
            .ok_or(AgentError::InvalidParallel { parallel, parallel_interactions })
    }
}

/// Stack records along a new leading time axis.
fn stack(records: &[TimestepRecord]) -> AgentResult<ExperienceInput> {
    let with_time_axis =
        |value: &StructuredValue| value.map(|tensor| tensor.clone().insert_axis(Axis(0)));
    let states: Vec<StructuredValue> = records.iter().map(|r| with_time_axis(&r.states)).collect();
    let actions: Vec<StructuredValue> =
        records.iter().map(|r| with_time_axis(&r.actions)).collect();
    let internals: Vec<StructuredValue> = records
        .iter()
        .map(|r| r.internals.as_ref().map(with_time_axis).unwrap_or_default())
        .collect();

    let internals = StructuredValue::concat_rows(&internals.iter().collect::<Vec<_>>())?;
    let input = ExperienceInput {
        states: StructuredValue::concat_rows(&states.iter().collect::<Vec<_>>())?,
        actions: StructuredValue::concat_rows(&actions.iter().collect::<Vec<_>>())?,
        terminal: Terminal::Codes(records.iter().map(|r| r.terminal).collect()),
        reward: records.iter().map(|r| r.reward).collect::<Array1<f64>>(),
        internals: (!internals.is_empty()).then_some(internals),
    };
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::Structured;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Flushing on terminal and on capacity, stacking along a time axis.
    // - Slot isolation and slot-index errors.
    // - Failed flushes leave the slot intact.
    // -------------------------------------------------------------------------

    fn record(x: f64, terminal: bool) -> TimestepRecord {
        let states = Structured::from_pairs([("obs", array![x, -x].into_dyn())]).expect("unique");
        let actions = Structured::from_pairs([("a", array![1.0].into_dyn())]).expect("unique");
        TimestepRecord::new(states, actions, terminal, x)
    }

    #[test]
    // Purpose
    // -------
    // A terminal step flushes its slot, stacked along a new leading axis.
    //
    // Given
    // -----
    // - capacity 10, records x = 1 (not terminal), x = 2 (terminal).
    //
    // Expect
    // ------
    // - first push buffers, second returns states of shape [2, 2] and
    //   terminal codes [0, 1]; the slot is empty afterwards.
    fn terminal_flushes_slot() {
        let mut buffers = InteractionBuffers::new(1, 10);

        let first = buffers.push(0, record(1.0, false)).expect("push");
        let second = buffers.push(0, record(2.0, true)).expect("push").expect("flushed");

        assert!(first.is_none());
        assert_eq!(second.states.require("obs").expect("obs").shape(), &[2, 2]);
        assert_eq!(second.actions.require("a").expect("a").shape(), &[2, 1]);
        assert_eq!(second.terminal.into_codes(), array![0, 1]);
        assert_eq!(second.reward, array![1.0, 2.0]);
        assert!(second.internals.is_none());
        assert!(buffers.is_idle());
    }

    #[test]
    // Purpose
    // -------
    // A full slot flushes without a terminal; other slots are untouched.
    fn capacity_flushes_only_own_slot() {
        let mut buffers = InteractionBuffers::new(2, 2);

        buffers.push(1, record(9.0, false)).expect("push");
        buffers.push(0, record(1.0, false)).expect("push");
        let flushed = buffers.push(0, record(2.0, false)).expect("push").expect("flushed");

        assert_eq!(flushed.reward.len(), 2);
        assert_eq!(buffers.slot_len(0).expect("slot"), 0);
        assert_eq!(buffers.slot_len(1).expect("slot"), 1);
        assert!(!buffers.is_idle());
    }

    #[test]
    // Purpose
    // -------
    // Unknown slots are rejected.
    fn unknown_slot_is_rejected() {
        let mut buffers = InteractionBuffers::new(2, 4);

        let err = buffers.push(2, record(0.0, false)).expect_err("out of range");

        assert_eq!(err, AgentError::InvalidParallel { parallel: 2, parallel_interactions: 2 });
    }

    #[test]
    // Purpose
    // -------
    // A terminal record that cannot be stacked with the slot is dropped and
    // the earlier timesteps stay buffered.
    //
    // Given
    // -----
    // - two valid records, then a terminal record whose state is named
    //   "other" instead of "obs".
    //
    // Expect
    // ------
    // - the third push errors, the slot still holds 2 records, and a valid
    //   terminal record then flushes all 3 timesteps.
    fn failed_flush_keeps_slot() {
        let mut buffers = InteractionBuffers::new(1, 10);
        buffers.push(0, record(1.0, false)).expect("push");
        buffers.push(0, record(2.0, false)).expect("push");
        let mut stray = record(3.0, true);
        stray.states =
            Structured::from_pairs([("other", array![3.0, -3.0].into_dyn())]).expect("unique");

        let err = buffers.push(0, stray);
        let kept = buffers.slot_len(0).expect("slot");
        let flushed = buffers.push(0, record(3.0, true)).expect("push").expect("flushed");

        assert!(err.is_err());
        assert_eq!(kept, 2);
        assert_eq!(flushed.reward, array![1.0, 2.0, 3.0]);
        assert!(buffers.is_idle());
    }

    #[test]
    // Purpose
    // -------
    // A single record converts to a one-step input.
    fn record_to_input_adds_time_axis() {
        let input = record(2.0, true).to_input().expect("input");

        assert_eq!(input.states.require("obs").expect("obs").shape(), &[1, 2]);
        assert_eq!(input.terminal.into_codes(), array![1]);
        assert_abs_diff_eq!(input.reward[0], 2.0);
    }
}
