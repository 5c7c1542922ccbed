//! agent — experience orchestration around a trainable model.
//!
//! Purpose
//! -------
//! Turn raw interaction data into validated, size-bounded experience batches
//! for a [`models::Model`], drive its updates on a schedule, and pretrain it
//! from recorded trace files.
//!
//! Key behaviors
//! -------------
//! - [`orchestrator::Agent`]: `experience`, `observe`, `update`, `pretrain`.
//! - [`core`]: specs, options, batch format, validation, interaction buffers
//!   and trace I/O.
//! - [`models`]: the `Model` trait, return estimation and the reference
//!   policy-gradient model.
//! - [`errors`]: [`AgentError`] / [`AgentResult`], wrapping optimizer errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Validation happens in the agent; models receive conforming batches.
//! - Counters are owned by the model and mirrored by the agent after every
//!   call.
//!
//! Testing notes
//! -------------
//! - `tests/integration_agent_pipeline.rs` covers experience, update and
//!   pretraining end to end.

pub mod core;
pub mod errors;
pub mod models;
pub mod orchestrator;

pub use self::errors::{AgentError, AgentResult};
pub use self::orchestrator::Agent;

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::errors::{AgentError, AgentResult};
    pub use super::models::prelude::*;
    pub use super::orchestrator::Agent;
}
