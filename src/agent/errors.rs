//! Errors for the agent layer (argument validation, episode state, trace
//! files, and wrapped optimizer failures).
//!
//! ## Conventions
//! - `argument` / `name` fields carry the user-facing argument path, e.g.
//!   `len(actions[action])` or `update[batch_size]`.
//! - Trace I/O errors are stored as strings so the type stays `Clone` and
//!   `PartialEq` like the optimizer errors.
//! - Optimizer errors are kept intact in [`AgentError::Optimization`].
use crate::optimization::errors::OptError;

/// Result alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

#[derive(Debug, Clone, PartialEq)]
pub enum AgentError {
    // ---- Episode state ----
    /// `experience` was called while an interaction buffer holds timesteps.
    MidEpisode,

    /// Parallel slot index outside `[0, parallel_interactions)`.
    InvalidParallel { parallel: usize, parallel_interactions: usize },

    // ---- Argument validation ----
    /// An input array does not share the leading length of the states.
    LengthMismatch { argument: String, expected: usize, found: usize },

    /// A required argument is absent under the given condition.
    MissingArgument { name: String, condition: &'static str },

    /// An argument has an inadmissible value.
    InvalidArgument { name: String, value: String, hint: &'static str },

    /// Trailing shape of an input does not match its spec.
    InvalidShape { name: String, expected: Vec<usize>, found: Vec<usize> },

    // ---- Traces ----
    /// Trace file could not be read or written.
    TraceIo { path: String, reason: String },

    /// Trace file content is not a valid experience snapshot.
    InvalidTrace { path: String, reason: String },

    /// Directory holds no `trace-*` files.
    NoTraces { directory: String },

    // ---- Optimization ----
    /// Failure raised by the optimization core.
    Optimization(OptError),
}

impl std::error::Error for AgentError {}

impl std::fmt::Display for AgentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentError::MidEpisode => {
                write!(f, "Calling experience is not possible mid-episode.")
            }
            AgentError::InvalidParallel { parallel, parallel_interactions } => {
                write!(
                    f,
                    "Parallel index {parallel} out of range for {parallel_interactions} parallel interactions."
                )
            }
            AgentError::LengthMismatch { argument, expected, found } => {
                write!(f, "Invalid value for {argument}: {found} != len(states) = {expected}")
            }
            AgentError::MissingArgument { name, condition } => {
                write!(f, "Missing required argument {name} given {condition}.")
            }
            AgentError::InvalidArgument { name, value, hint } => {
                write!(f, "Invalid value for {name}: {value} ({hint}).")
            }
            AgentError::InvalidShape { name, expected, found } => {
                write!(f, "Invalid shape for {name}: expected {expected:?}, got {found:?}")
            }
            AgentError::TraceIo { path, reason } => {
                write!(f, "Trace I/O failed for {path}: {reason}")
            }
            AgentError::InvalidTrace { path, reason } => {
                write!(f, "Invalid trace {path}: {reason}")
            }
            AgentError::NoTraces { directory } => {
                write!(f, "No trace files found in {directory}")
            }
            AgentError::Optimization(err) => write!(f, "Optimization failed: {err}"),
        }
    }
}

impl From<OptError> for AgentError {
    fn from(err: OptError) -> Self {
        AgentError::Optimization(err)
    }
}
