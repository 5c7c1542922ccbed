//! The model interface consumed by the agent.
use crate::agent::{
    core::{batch::ExperienceBatch, counters::Counters},
    errors::AgentResult,
};

/// A trainable model fed by the agent.
///
/// The agent guarantees that every batch passed to [`Model::experience`] is
/// validated against its specs and holds at most
/// [`Model::experience_capacity`] timesteps. Updates go through `&mut self`,
/// so at most one update runs at a time.
pub trait Model {
    /// Largest number of timesteps a single `experience` call accepts.
    fn experience_capacity(&self) -> usize;

    /// Ingest one batch; return the counters after ingestion.
    fn experience(&mut self, batch: &ExperienceBatch) -> AgentResult<Counters>;

    /// Perform one update from stored experience; return the counters after
    /// the update.
    fn update(&mut self) -> AgentResult<Counters>;

    /// Current counters.
    fn counters(&self) -> Counters;
}
