//! core — agent-side data types, options, validation and buffering.
//!
//! Purpose
//! -------
//! Collect the building blocks the agent orchestrator assembles: input
//! specifications, resolved options, the experience batch format and its
//! splitting rule, validation helpers, per-slot interaction buffers and
//! trace-file I/O.
//!
//! Key behaviors
//! -------------
//! - [`StateSpec`] / [`ActionSpec`] declare names and per-step shapes.
//! - [`AgentOptions`] resolves `buffer_observe` from the update schedule.
//! - [`ExperienceBatch`] is the model-facing tensor form; [`batch_ranges`]
//!   cuts experience at terminals and at the model's capacity.
//! - [`InteractionBuffers`] hold timesteps per parallel slot until a flush.
//! - [`write_trace`] / [`read_trace`] / [`list_traces`] handle trace files.
//!
//! Invariants & assumptions
//! ------------------------
//! - Experience tensors carry a leading time axis shared by every field.
//! - Validation functions report the offending argument by name and never
//!   mutate their input.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests; the agent pipeline is exercised end
//!   to end in `tests/integration_agent_pipeline.rs`.

pub mod batch;
pub mod buffers;
pub mod counters;
pub mod options;
pub mod specs;
pub mod traces;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::batch::{batch_ranges, ExperienceBatch, ExperienceInput, Terminal};
pub use self::buffers::{InteractionBuffers, TimestepRecord};
pub use self::counters::Counters;
pub use self::options::{AgentOptions, UpdateSpec, UpdateUnit, DEFAULT_EPISODE_BUFFER};
pub use self::specs::{ActionSpec, StateSpec};
pub use self::traces::{list_traces, read_trace, write_trace, TRACE_PREFIX};

pub mod prelude {
    pub use super::batch::{ExperienceBatch, ExperienceInput, Terminal};
    pub use super::buffers::TimestepRecord;
    pub use super::counters::Counters;
    pub use super::options::{AgentOptions, UpdateSpec, UpdateUnit};
    pub use super::specs::{ActionSpec, StateSpec};
    pub use super::traces::write_trace;
}
