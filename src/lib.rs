//! rust_rlopt — line-search policy optimization core for reinforcement
//! learning agents.
//!
//! Purpose
//! -------
//! Serve as the crate root for the numeric optimization core of a policy
//! gradient agent: a backtracking line-search solver over named tensor
//! collections, an L-BFGS step proposal layer, and the agent-level
//! orchestration that batches experience and drives model updates.
//!
//! Key behaviors
//! -------------
//! - `structured`: ordered `name -> tensor` collections with positional,
//!   key-checked element-wise operations.
//! - `optimization`: iterative solvers, line search, argmin-backed
//!   proposals, scalar parameter schedules and the `OptError` surface.
//! - `agent`: experience validation and batching, parallel interaction
//!   buffers, trace-file pretraining and the `Model` trait with a reference
//!   linear-softmax policy model.
//! - `utils`: `slog` logger helpers.
//!
//! Invariants & assumptions
//! ------------------------
//! - Structured operations fail fast on key or shape mismatches.
//! - Non-test code reports failures through `OptResult` / `AgentResult`
//!   and does not panic on bad input.
//!
//! Conventions
//! -----------
//! - Objectives are maximized.
//! - The leading axis of every experience tensor is time.
//! - Components log through a caller-supplied `slog::Logger` and discard
//!   records by default.
//!
//! Testing notes
//! -------------
//! - Unit tests sit next to the code they cover.
//! - Integration tests in `tests/` replay solver traces and run the agent
//!   pipeline end to end, including pretraining from trace files.

pub mod agent;
pub mod optimization;
pub mod structured;
pub mod utils;
