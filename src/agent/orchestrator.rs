//! orchestrator — experience batching and update driving.
//!
//! Purpose
//! -------
//! Sit between callers and a [`Model`]: validate raw experience, convert it
//! into [`ExperienceBatch`]es no longer than the model's capacity, feed them
//! to the model, trigger updates, and keep the running counters and the
//! schedule clock in sync.
//!
//! Key behaviors
//! -------------
//! - [`Agent::experience`] rejects calls while any interaction buffer holds
//!   timesteps, validates lengths (naming the offending field), moves
//!   `<action>_mask` states into `<action>/mask` auxiliaries (all-ones when
//!   absent), splits with [`batch_ranges`] and ingests each batch.
//! - [`Agent::observe`] buffers single timesteps per parallel slot, ingests a
//!   slot when it flushes, and runs an update when the [`UpdateSpec`] says
//!   one is due.
//! - [`Agent::pretrain`] loads `trace-*` files, shuffles them with the
//!   agent's seeded RNG, concatenates a selection per iteration, moves
//!   auxiliary masks back into the states, ingests and updates.
//! - After every model call the counters are replaced by the model's and the
//!   [`Clock`] is set to the timestep counter.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every batch handed to the model is validated against the agent specs
//!   and holds at most `experience_size` timesteps.
//! - Model updates take `&mut self`, so they never overlap.
//!
//! Conventions
//! -----------
//! - Error arguments follow the `len(actions[name])` / `states[name]`
//!   naming of the inputs.
//!
//! [`UpdateSpec`]: crate::agent::core::UpdateSpec
use crate::{
    agent::{
        core::{
            batch::{batch_ranges, ExperienceBatch, ExperienceInput, Terminal},
            buffers::{InteractionBuffers, TimestepRecord},
            counters::Counters,
            options::{AgentOptions, UpdateUnit},
            specs::{ActionSpec, StateSpec},
            traces::{list_traces, read_trace},
            validation::{
                check_leading_len, check_len, conform_actions, conform_states, num_instances,
                validate_action_values, validate_mask, validate_reward, validate_terminal,
            },
        },
        errors::{AgentError, AgentResult},
        models::Model,
    },
    optimization::parameters::Clock,
    structured::{Structured, StructuredValue, Tensor},
    utils::discard_logger,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use slog::{debug, info, o, Logger};
use std::{collections::HashSet, path::Path};

/// Experience/update orchestrator around a model.
#[derive(Debug)]
pub struct Agent<M: Model> {
    states_spec: Vec<StateSpec>,
    actions_spec: Vec<ActionSpec>,
    internals_spec: Vec<StateSpec>,
    options: AgentOptions,
    model: M,
    buffers: InteractionBuffers,
    counters: Counters,
    last_update_at: u64,
    clock: Clock,
    rng: StdRng,
    logger: Logger,
}

impl<M: Model> Agent<M> {
    /// # Errors
    /// - [`AgentError::MissingArgument`] without state or action specs.
    /// - [`AgentError::InvalidArgument`] for duplicate names across states,
    ///   actions and action masks.
    pub fn new(
        states_spec: Vec<StateSpec>, actions_spec: Vec<ActionSpec>, options: AgentOptions,
        model: M,
    ) -> AgentResult<Self> {
        if states_spec.is_empty() {
            return Err(AgentError::MissingArgument {
                name: "states".to_string(),
                condition: "constructing an agent",
            });
        }
        if actions_spec.is_empty() {
            return Err(AgentError::MissingArgument {
                name: "actions".to_string(),
                condition: "constructing an agent",
            });
        }
        let mut seen = HashSet::new();
        let names = states_spec
            .iter()
            .map(|s| s.name.clone())
            .chain(actions_spec.iter().map(|a| a.name.clone()))
            .chain(actions_spec.iter().filter(|a| a.is_discrete()).map(|a| a.mask_state_name()));
        for name in names {
            if !seen.insert(name.clone()) {
                return Err(AgentError::InvalidArgument {
                    name,
                    value: "duplicate".to_string(),
                    hint: "names of states, actions and masks must be unique",
                });
            }
        }
        let buffers = InteractionBuffers::new(options.parallel_interactions, options.buffer_observe);
        let rng = StdRng::seed_from_u64(options.seed);
        Ok(Self {
            states_spec,
            actions_spec,
            internals_spec: Vec::new(),
            options,
            model,
            buffers,
            counters: Counters::default(),
            last_update_at: 0,
            clock: Clock::new(),
            rng,
            logger: discard_logger(),
        })
    }

    /// Declare internal states carried alongside the experience.
    pub fn with_internals(mut self, internals_spec: Vec<StateSpec>) -> Self {
        self.internals_spec = internals_spec;
        self
    }

    /// Share `clock` with parameter schedules; it is set to the timestep
    /// counter after every model call.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        clock.set(self.counters.timesteps);
        self.clock = clock;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger.new(o!("component" => "agent"));
        self
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Largest batch handed to the model.
    pub fn experience_size(&self) -> usize {
        self.model.experience_capacity()
    }

    /// Drop every buffered timestep of every slot.
    pub fn reset(&mut self) {
        self.buffers.reset();
    }

    /// Feed a run of experience.
    ///
    /// # Errors
    /// - [`AgentError::MidEpisode`] if any interaction slot holds timesteps.
    /// - Validation errors naming the offending argument.
    /// - Errors raised by the model.
    pub fn experience(&mut self, input: ExperienceInput) -> AgentResult<Counters> {
        if !self.buffers.is_idle() {
            return Err(AgentError::MidEpisode);
        }
        let batch = self.prepare(input)?;
        self.ingest(&batch)
    }

    /// Run one model update.
    pub fn update(&mut self) -> AgentResult<Counters> {
        let counters = self.model.update()?;
        self.sync(counters);
        info!(self.logger, "update";
            "timesteps" => counters.timesteps,
            "episodes" => counters.episodes,
            "updates" => counters.updates);
        Ok(counters)
    }

    /// Record one timestep of slot `parallel`.
    ///
    /// The record is validated before it is buffered; a rejected record
    /// leaves the slot's earlier timesteps in place. Returns `true` when an
    /// update ran.
    ///
    /// # Errors
    /// - [`AgentError::InvalidParallel`] for an unknown slot.
    /// - Validation errors of the record.
    /// - Model errors of the flushed experience.
    pub fn observe(&mut self, parallel: usize, record: TimestepRecord) -> AgentResult<bool> {
        self.prepare(record.to_input()?)?;
        if let Some(input) = self.buffers.push(parallel, record)? {
            let batch = self.prepare(input)?;
            self.ingest(&batch)?;
        }
        self.maybe_update()
    }

    /// Pretrain from trace files.
    ///
    /// Per iteration: shuffle the trace indices, take the first `num_traces`
    /// (one when `None`, capped at the number of files), concatenate them,
    /// ingest the result and update `num_updates` times.
    ///
    /// # Errors
    /// - [`AgentError::InvalidArgument`] for zero counts or a missing
    ///   directory; [`AgentError::NoTraces`] for an empty one.
    /// - Trace, validation and model errors.
    pub fn pretrain(
        &mut self, directory: &Path, num_iterations: usize, num_traces: Option<usize>,
        num_updates: usize,
    ) -> AgentResult<Counters> {
        for (name, value) in [
            ("num_iterations", Some(num_iterations)),
            ("num_traces", num_traces),
            ("num_updates", Some(num_updates)),
        ] {
            if value == Some(0) {
                return Err(AgentError::InvalidArgument {
                    name: name.to_string(),
                    value: "0".to_string(),
                    hint: "< 1",
                });
            }
        }
        let files = list_traces(directory)?;
        let mut indices: Vec<usize> = (0..files.len()).collect();
        for iteration in 0..num_iterations {
            indices.shuffle(&mut self.rng);
            let take = num_traces.unwrap_or(1).min(indices.len());
            let traces = indices[..take]
                .iter()
                .map(|&i| read_trace(&files[i]))
                .collect::<AgentResult<Vec<_>>>()?;
            let parts: Vec<&ExperienceBatch> = traces.iter().collect();
            let batch = ExperienceBatch::concat(&parts)?;
            debug!(self.logger, "pretrain iteration";
                "iteration" => iteration,
                "traces" => take,
                "timesteps" => batch.len());

            self.experience(trace_input(batch, directory)?)?;
            for _ in 0..num_updates {
                self.update()?;
            }
        }
        Ok(self.counters)
    }

    /// Validate raw experience and convert it to a batch.
    fn prepare(&self, input: ExperienceInput) -> AgentResult<ExperienceBatch> {
        let ExperienceInput { mut states, actions, terminal, reward, internals } = input;
        let internals = internals.unwrap_or_default();

        let n = num_instances(&states)?;
        check_leading_len(&internals, "internals", n)?;
        check_leading_len(&actions, "actions", n)?;
        check_len("terminal", terminal.len(), n)?;
        check_len("reward", reward.len(), n)?;

        let mut masks = Vec::new();
        for spec in self.actions_spec.iter().filter(|a| a.is_discrete()) {
            let mut shape = vec![n];
            shape.extend(spec.mask_shape().unwrap_or_default());
            let mask = states
                .remove(&spec.mask_state_name())
                .unwrap_or_else(|| Tensor::ones(shape.as_slice()));
            if mask.shape() != shape.as_slice() {
                return Err(AgentError::InvalidShape {
                    name: format!("states[{}]", spec.mask_state_name()),
                    expected: shape,
                    found: mask.shape().to_vec(),
                });
            }
            masks.push((spec, mask));
        }

        let states = conform_states(&states, "states", &self.states_spec)?;
        let internals = conform_states(&internals, "internals", &self.internals_spec)?;
        let actions = conform_actions(&actions, &self.actions_spec)?;
        validate_action_values(&actions, &self.actions_spec)?;

        let mut auxiliaries: StructuredValue = Structured::new();
        for (spec, mask) in masks {
            validate_mask(spec, &mask, actions.require(&spec.name)?)?;
            auxiliaries.insert(spec.mask_auxiliary_name(), mask)?;
        }

        let terminal = terminal.into_codes();
        validate_terminal(&terminal)?;
        validate_reward(&reward)?;
        Ok(ExperienceBatch { states, internals, auxiliaries, actions, terminal, reward })
    }

    /// Split `batch` at terminals and capacity and feed the pieces.
    fn ingest(&mut self, batch: &ExperienceBatch) -> AgentResult<Counters> {
        let ranges = batch_ranges(&batch.terminal.to_vec(), self.experience_size());
        for range in ranges {
            let piece = batch.slice(range.clone());
            let counters = self.model.experience(&piece)?;
            self.sync(counters);
            debug!(self.logger, "experience batch";
                "start" => range.start,
                "end" => range.end,
                "timesteps" => counters.timesteps,
                "episodes" => counters.episodes);
        }
        Ok(self.counters)
    }

    fn maybe_update(&mut self) -> AgentResult<bool> {
        let spec = &self.options.update;
        let progress = match spec.unit {
            UpdateUnit::Timesteps => self.counters.timesteps,
            UpdateUnit::Episodes => self.counters.episodes,
        };
        let started = progress >= spec.start.max(spec.batch_size) as u64;
        let due = progress.saturating_sub(self.last_update_at) >= spec.frequency as u64;
        if !(started && due) {
            return Ok(false);
        }
        self.last_update_at = progress;
        self.update()?;
        Ok(true)
    }

    fn sync(&mut self, counters: Counters) {
        self.counters = counters;
        self.clock.set(counters.timesteps);
    }
}

/// Rebuild experience input from a concatenated trace: auxiliaries named
/// `<action>/mask` become states named `<action>_mask`.
fn trace_input(batch: ExperienceBatch, directory: &Path) -> AgentResult<ExperienceInput> {
    let ExperienceBatch { mut states, internals, auxiliaries, actions, terminal, reward } = batch;
    for (name, value) in auxiliaries.into_pairs() {
        let Some(action) = name.strip_suffix("/mask") else {
            return Err(AgentError::InvalidTrace {
                path: directory.display().to_string(),
                reason: format!("unexpected auxiliary '{name}'"),
            });
        };
        states.insert(format!("{action}_mask"), value)?;
    }
    Ok(ExperienceInput {
        states,
        actions,
        terminal: Terminal::Codes(terminal),
        reward,
        internals: (!internals.is_empty()).then_some(internals),
    })
}
