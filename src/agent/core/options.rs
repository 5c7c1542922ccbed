//! Agent options — update schedule and interaction buffering.
//!
//! Purpose
//! -------
//! Collect the knobs that decide when experience is handed to the model and
//! when the model updates: the number of parallel interaction slots, how many
//! timesteps a slot buffers before flushing, the episode length bound, the
//! update schedule and the RNG seed.
//!
//! Key behaviors
//! -------------
//! - [`UpdateUnit`] and [`UpdateSpec`] describe when updates fire.
//! - [`AgentOptions::new`] resolves `buffer_observe` from the other fields
//!   and rejects inconsistent combinations:
//!   - `parallel_interactions == 0` is invalid;
//!   - with several parallel slots, `buffer_observe` defaults to
//!     `max_episode_timesteps` (then required) and may not be smaller;
//!   - with a timestep update unit, it defaults to `batch_size` and may not
//!     be larger;
//!   - with an episode update unit, it defaults to `max_episode_timesteps`,
//!     or 1000 when that is unbounded.
//!
//! Invariants & assumptions
//! ------------------------
//! - A constructed [`AgentOptions`] always has `buffer_observe >= 1`.
//! - `batch_size` and `frequency` are at least 1.
//!
//! Testing notes
//! -------------
//! - Unit tests cover every resolution branch and the error paths.
use crate::agent::errors::{AgentError, AgentResult};
use std::str::FromStr;

/// Default `buffer_observe` for episode-based updates without an episode
/// length bound.
pub const DEFAULT_EPISODE_BUFFER: usize = 1000;

/// Unit in which the update schedule counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateUnit {
    Timesteps,
    Episodes,
}

impl FromStr for UpdateUnit {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "timesteps" => Ok(UpdateUnit::Timesteps),
            "episodes" => Ok(UpdateUnit::Episodes),
            _ => Err(AgentError::InvalidArgument {
                name: "update[unit]".to_string(),
                value: s.to_string(),
                hint: "not in {timesteps, episodes}",
            }),
        }
    }
}

/// Update schedule.
///
/// Fields:
/// - `unit`: counts timesteps or episodes.
/// - `batch_size`: number of units an update consumes.
/// - `frequency`: units between two updates.
/// - `start`: units to collect before the first update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSpec {
    pub unit: UpdateUnit,
    pub batch_size: usize,
    pub frequency: usize,
    pub start: usize,
}

impl UpdateSpec {
    /// `frequency` defaults to `batch_size`, `start` to 0.
    ///
    /// # Errors
    /// - [`AgentError::InvalidArgument`] for an unknown unit or a zero
    ///   `batch_size` / `frequency`.
    pub fn new(
        unit: &str, batch_size: usize, frequency: Option<usize>, start: Option<usize>,
    ) -> AgentResult<Self> {
        let unit = unit.parse::<UpdateUnit>()?;
        if batch_size == 0 {
            return Err(AgentError::InvalidArgument {
                name: "update[batch_size]".to_string(),
                value: batch_size.to_string(),
                hint: "< 1",
            });
        }
        let frequency = frequency.unwrap_or(batch_size);
        if frequency == 0 {
            return Err(AgentError::InvalidArgument {
                name: "update[frequency]".to_string(),
                value: frequency.to_string(),
                hint: "< 1",
            });
        }
        Ok(Self { unit, batch_size, frequency, start: start.unwrap_or(0) })
    }

    /// Timestep-based schedule with default frequency and start.
    pub fn timesteps(batch_size: usize) -> AgentResult<Self> {
        Self::new("timesteps", batch_size, None, None)
    }
}

/// Resolved agent configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    pub parallel_interactions: usize,
    pub buffer_observe: usize,
    pub max_episode_timesteps: Option<usize>,
    pub update: UpdateSpec,
    /// Seed of the agent RNG (trace shuffling during pretraining).
    pub seed: u64,
}

impl AgentOptions {
    /// Resolve `buffer_observe` and validate the combination.
    ///
    /// # Errors
    /// - [`AgentError::InvalidArgument`] for `parallel_interactions == 0`,
    ///   `max_episode_timesteps == Some(0)`, `buffer_observe == Some(0)` or a
    ///   `buffer_observe` incompatible with the update schedule.
    /// - [`AgentError::MissingArgument`] when several parallel slots are
    ///   requested without `max_episode_timesteps` or `buffer_observe`.
    pub fn new(
        parallel_interactions: usize, buffer_observe: Option<usize>,
        max_episode_timesteps: Option<usize>, update: UpdateSpec, seed: u64,
    ) -> AgentResult<Self> {
        if parallel_interactions == 0 {
            return Err(AgentError::InvalidArgument {
                name: "parallel_interactions".to_string(),
                value: parallel_interactions.to_string(),
                hint: "< 1",
            });
        }
        if max_episode_timesteps == Some(0) {
            return Err(AgentError::InvalidArgument {
                name: "max_episode_timesteps".to_string(),
                value: "0".to_string(),
                hint: "< 1",
            });
        }
        if buffer_observe == Some(0) {
            return Err(AgentError::InvalidArgument {
                name: "config[buffer_observe]".to_string(),
                value: "0".to_string(),
                hint: "< 1",
            });
        }
        let buffer_observe = if parallel_interactions > 1 {
            match (buffer_observe, max_episode_timesteps) {
                (None, None) => {
                    return Err(AgentError::MissingArgument {
                        name: "max_episode_timesteps".to_string(),
                        condition: "parallel_interactions > 1",
                    })
                }
                (None, Some(max)) => max,
                (Some(buffer), Some(max)) if buffer < max => {
                    return Err(AgentError::InvalidArgument {
                        name: "config[buffer_observe]".to_string(),
                        value: buffer.to_string(),
                        hint: "< max_episode_timesteps",
                    })
                }
                (Some(buffer), _) => buffer,
            }
        } else {
            match update.unit {
                UpdateUnit::Timesteps => match buffer_observe {
                    None => update.batch_size,
                    Some(buffer) if buffer > update.batch_size => {
                        return Err(AgentError::InvalidArgument {
                            name: "config[buffer_observe]".to_string(),
                            value: buffer.to_string(),
                            hint: "> update[batch_size]",
                        })
                    }
                    Some(buffer) => buffer,
                },
                UpdateUnit::Episodes => buffer_observe
                    .or(max_episode_timesteps)
                    .unwrap_or(DEFAULT_EPISODE_BUFFER),
            }
        };
        Ok(Self { parallel_interactions, buffer_observe, max_episode_timesteps, update, seed })
    }

    /// Single-slot options with a timestep update schedule.
    pub fn single(batch_size: usize, max_episode_timesteps: Option<usize>) -> AgentResult<Self> {
        Self::new(1, None, max_episode_timesteps, UpdateSpec::timesteps(batch_size)?, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - `buffer_observe` resolution for parallel, timestep and episode setups.
    // - Rejection of inconsistent or degenerate combinations.
    // -------------------------------------------------------------------------

    fn episodes(batch_size: usize) -> UpdateSpec {
        UpdateSpec::new("episodes", batch_size, None, None).expect("valid")
    }

    #[test]
    // Purpose
    // -------
    // Several parallel slots buffer a whole episode by default.
    fn parallel_defaults_to_episode_length() {
        let opts = AgentOptions::new(4, None, Some(200), episodes(2), 0).expect("valid");

        assert_eq!(opts.buffer_observe, 200);
    }

    #[test]
    // Purpose
    // -------
    // Parallel slots need an episode bound or an explicit buffer, and an
    // explicit buffer may not be shorter than an episode.
    fn parallel_rejects_missing_or_short_buffer() {
        let missing = AgentOptions::new(2, None, None, episodes(1), 0);
        let short = AgentOptions::new(2, Some(50), Some(100), episodes(1), 0);

        assert!(matches!(missing, Err(AgentError::MissingArgument { .. })));
        assert!(matches!(
            short,
            Err(AgentError::InvalidArgument { hint: "< max_episode_timesteps", .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Timestep updates buffer at most one batch.
    //
    // Given
    // -----
    // - `batch_size = 16`.
    //
    // Expect
    // ------
    // - default 16, explicit 8 kept, explicit 32 rejected.
    fn timesteps_bound_buffer_by_batch_size() {
        let update = UpdateSpec::timesteps(16).expect("valid");

        let default = AgentOptions::new(1, None, None, update.clone(), 0).expect("valid");
        let smaller = AgentOptions::new(1, Some(8), None, update.clone(), 0).expect("valid");
        let larger = AgentOptions::new(1, Some(32), None, update, 0);

        assert_eq!(default.buffer_observe, 16);
        assert_eq!(smaller.buffer_observe, 8);
        assert!(larger.is_err());
    }

    #[test]
    // Purpose
    // -------
    // Episode updates fall back to the episode bound, then to 1000.
    fn episodes_default_buffer() {
        let bounded = AgentOptions::new(1, None, Some(300), episodes(1), 0).expect("valid");
        let unbounded = AgentOptions::new(1, None, None, episodes(1), 0).expect("valid");

        assert_eq!(bounded.buffer_observe, 300);
        assert_eq!(unbounded.buffer_observe, DEFAULT_EPISODE_BUFFER);
    }

    #[test]
    // Purpose
    // -------
    // Degenerate values fail fast.
    fn degenerate_values_are_rejected() {
        assert!(AgentOptions::new(0, None, None, episodes(1), 0).is_err());
        assert!(UpdateSpec::new("timesteps", 0, None, None).is_err());
        assert!(UpdateSpec::new("steps", 4, None, None).is_err());
        assert_eq!("Episodes".parse::<UpdateUnit>().expect("valid"), UpdateUnit::Episodes);
    }
}
