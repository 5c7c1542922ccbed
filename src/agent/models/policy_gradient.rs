//! policy_gradient — reference linear softmax policy model.
//!
//! Purpose
//! -------
//! Provide a complete [`Model`] the agent can drive end to end: a linear
//! softmax policy over one vector state and one discrete action, trained by
//! one proposal + line-search step on an importance-weighted surrogate per
//! update.
//!
//! Key behaviors
//! -------------
//! - `experience`: per timestep, feed `(features, action, mask)` and the
//!   reward into a [`ReturnEstimator`]; completed steps enter a bounded
//!   replay memory (oldest evicted first).
//! - `update`: sample `batch_size` transitions with the model's seeded RNG,
//!   compute mean-baseline advantages `A = G - mean(G)`, record the chosen
//!   action's probability under the current parameters, and run
//!   [`LinesearchStep::step`] on the [`Surrogate`]. Updates with fewer than
//!   `batch_size` stored transitions are skipped.
//! - `act`: sample an action from the masked policy.
//!
//! Invariants & assumptions
//! ------------------------
//! - The state spec has shape `[d]`; the action spec is a scalar discrete
//!   action with `k` values; parameters are `{weights: [d, k], bias: [k]}`.
//! - The experience capacity is the estimator capacity (horizon, or
//!   `max_episode_timesteps` for episode returns).
//! - `l2_regularization` is read once per update, so it may follow a
//!   schedule on the agent clock.
//!
//! Downstream usage
//! ----------------
//! - Construct with the agent's specs and hand it to `Agent::new`.
use crate::{
    agent::{
        core::{
            batch::ExperienceBatch,
            counters::Counters,
            specs::{ActionSpec, StateSpec},
        },
        errors::{AgentError, AgentResult},
        models::{
            estimator::{EstimatorOptions, ReturnEstimator},
            model::Model,
            surrogate::{initial_parameters, policy_probabilities, Surrogate, SurrogateData},
        },
    },
    optimization::{
        linesearch_step::{LinesearchStep, LinesearchStepOptions, StepOutcome},
        parameters::{constant, validate_parameter, ScalarParameter, SharedParameter},
    },
    structured::{StructuredValue, Tensor},
    utils::discard_logger,
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Ix1, Ix2};
use rand::{
    distributions::{Distribution, WeightedIndex},
    rngs::StdRng,
    seq::index,
    SeedableRng,
};
use slog::{debug, info, o, Logger};
use std::collections::VecDeque;

/// Policy-gradient model configuration.
///
/// Fields:
/// - `memory_capacity`: replay memory size in transitions.
/// - `batch_size`: transitions per update, `<= memory_capacity`.
/// - `estimator`: return horizon and discount.
/// - `l2_regularization`: penalty coefficient, `>= 0`.
/// - `optimizer`: proposal and line-search settings.
/// - `seed`: seed of the sampling RNG.
///
/// Default: memory 10_000, batch 64, episode returns with discount 0.99,
/// `l2 = 0.01`, default optimizer, seed 0.
#[derive(Debug, Clone)]
pub struct PolicyGradientOptions {
    pub memory_capacity: usize,
    pub batch_size: usize,
    pub estimator: EstimatorOptions,
    pub l2_regularization: SharedParameter,
    pub optimizer: LinesearchStepOptions,
    pub seed: u64,
}

impl Default for PolicyGradientOptions {
    fn default() -> Self {
        Self {
            memory_capacity: 10_000,
            batch_size: 64,
            estimator: EstimatorOptions::default(),
            l2_regularization: constant(0.01),
            optimizer: LinesearchStepOptions::default(),
            seed: 0,
        }
    }
}

impl PolicyGradientOptions {
    /// # Errors
    /// - [`AgentError::InvalidArgument`] for `batch_size == 0` or
    ///   `batch_size > memory_capacity`.
    /// - [`AgentError::Optimization`] if `l2_regularization` can be negative.
    pub fn new(
        memory_capacity: usize, batch_size: usize, estimator: EstimatorOptions,
        l2_regularization: SharedParameter, optimizer: LinesearchStepOptions, seed: u64,
    ) -> AgentResult<Self> {
        if batch_size == 0 {
            return Err(AgentError::InvalidArgument {
                name: "batch_size".to_string(),
                value: batch_size.to_string(),
                hint: "< 1",
            });
        }
        if batch_size > memory_capacity {
            return Err(AgentError::InvalidArgument {
                name: "batch_size".to_string(),
                value: batch_size.to_string(),
                hint: "> memory_capacity",
            });
        }
        validate_parameter("l2_regularization", l2_regularization.as_ref(), 0.0, f64::INFINITY)?;
        Ok(Self { memory_capacity, batch_size, estimator, l2_regularization, optimizer, seed })
    }
}

/// One step waiting for its return.
#[derive(Debug, Clone, PartialEq)]
struct Step {
    features: Array1<f64>,
    action: usize,
    mask: Array1<f64>,
}

/// A step with its completed return.
#[derive(Debug, Clone, PartialEq)]
struct Transition {
    step: Step,
    ret: f64,
}

/// Linear softmax policy trained with line-search surrogate steps.
#[derive(Debug)]
pub struct PolicyGradientModel {
    state: StateSpec,
    action: ActionSpec,
    num_values: usize,
    options: PolicyGradientOptions,
    params: StructuredValue,
    estimator: ReturnEstimator<Step>,
    memory: VecDeque<Transition>,
    optimizer: LinesearchStep,
    counters: Counters,
    last_step: Option<StepOutcome>,
    rng: StdRng,
    logger: Logger,
}

impl PolicyGradientModel {
    /// # Errors
    /// - [`AgentError::InvalidArgument`] if the state is not a vector or the
    ///   action is not a scalar discrete action.
    /// - [`AgentError::MissingArgument`] for episode returns without
    ///   `max_episode_timesteps`.
    pub fn new(
        state: StateSpec, action: ActionSpec, options: PolicyGradientOptions,
        max_episode_timesteps: Option<usize>,
    ) -> AgentResult<Self> {
        let &[num_features] = state.shape.as_slice() else {
            return Err(AgentError::InvalidArgument {
                name: format!("states[{}].shape", state.name),
                value: format!("{:?}", state.shape),
                hint: "policy expects a vector state",
            });
        };
        let num_values = match (action.num_values, action.shape.is_empty()) {
            (Some(k), true) => k,
            _ => {
                return Err(AgentError::InvalidArgument {
                    name: format!("actions[{}]", action.name),
                    value: format!("{:?}", action.shape),
                    hint: "policy expects a scalar discrete action",
                })
            }
        };
        let params = initial_parameters(num_features, num_values)?;
        let estimator = ReturnEstimator::new(options.estimator, max_episode_timesteps)?;
        let optimizer = LinesearchStep::new(options.optimizer.clone());
        let rng = StdRng::seed_from_u64(options.seed);
        Ok(Self {
            state,
            action,
            num_values,
            params,
            estimator,
            memory: VecDeque::with_capacity(options.memory_capacity),
            optimizer,
            counters: Counters::default(),
            last_step: None,
            rng,
            logger: discard_logger(),
            options,
        })
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.optimizer = self.optimizer.with_logger(logger.clone());
        self.logger = logger.new(o!("model" => "policy_gradient"));
        self
    }

    pub fn params(&self) -> &StructuredValue {
        &self.params
    }

    pub fn options(&self) -> &PolicyGradientOptions {
        &self.options
    }

    /// Number of transitions in the replay memory.
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Steps still waiting for their return.
    pub fn pending_len(&self) -> usize {
        self.estimator.pending_len()
    }

    /// Outcome of the most recent optimizer step.
    pub fn last_step(&self) -> Option<&StepOutcome> {
        self.last_step.as_ref()
    }

    /// Masked action probabilities `[n, k]` for `[n, d]` features; `masks`
    /// defaults to all actions allowed.
    pub fn action_probabilities(
        &self, features: ArrayView2<'_, f64>, masks: Option<ArrayView2<'_, f64>>,
    ) -> AgentResult<Array2<f64>> {
        let probabilities = match masks {
            Some(masks) => policy_probabilities(&self.params, features, masks)?,
            None => {
                let ones = Array2::ones((features.nrows(), self.num_values));
                policy_probabilities(&self.params, features, ones.view())?
            }
        };
        Ok(probabilities)
    }

    /// Sample an action for one state.
    ///
    /// # Errors
    /// - Shape errors from [`PolicyGradientModel::action_probabilities`].
    /// - [`AgentError::InvalidArgument`] if the mask allows no action.
    pub fn act(
        &mut self, features: ArrayView1<'_, f64>, mask: Option<ArrayView1<'_, f64>>,
    ) -> AgentResult<usize> {
        let features = features.insert_axis(Axis(0));
        let mask = mask.map(|m| m.insert_axis(Axis(0)));
        let probabilities = self.action_probabilities(features, mask)?;
        let dist = WeightedIndex::new(probabilities.row(0).iter().copied()).map_err(|e| {
            AgentError::InvalidArgument {
                name: self.action.mask_state_name(),
                value: e.to_string(),
                hint: "no action available",
            }
        })?;
        Ok(dist.sample(&mut self.rng))
    }

    fn batch_views<'a>(
        &self, batch: &'a ExperienceBatch,
    ) -> AgentResult<(ArrayView2<'a, f64>, ArrayView1<'a, f64>, Array2<f64>)> {
        let n = batch.len();
        let features = matrix_view(
            "states",
            &self.state.name,
            batch.states.require(&self.state.name)?,
            [n, self.state.shape[0]],
        )?;
        let actions = batch.actions.require(&self.action.name)?;
        let actions = actions.view().into_dimensionality::<Ix1>().map_err(|_| {
            AgentError::InvalidShape {
                name: format!("actions[{}]", self.action.name),
                expected: vec![n],
                found: actions.shape().to_vec(),
            }
        })?;
        let mask_name = self.action.mask_auxiliary_name();
        let masks = match batch.auxiliaries.get(&mask_name) {
            Some(mask) => {
                matrix_view("auxiliaries", &mask_name, mask, [n, self.num_values])?.to_owned()
            }
            None => Array2::ones((n, self.num_values)),
        };
        Ok((features, actions, masks))
    }

    fn remember(&mut self, transition: Transition) {
        if self.memory.len() >= self.options.memory_capacity {
            self.memory.pop_front();
        }
        self.memory.push_back(transition);
    }

    fn surrogate_data(&mut self) -> AgentResult<SurrogateData> {
        let picks = index::sample(&mut self.rng, self.memory.len(), self.options.batch_size);
        let sampled: Vec<&Transition> = picks.iter().map(|i| &self.memory[i]).collect();
        let num_features = self.state.shape[0];
        let n = sampled.len();

        let mut features = Array2::zeros((n, num_features));
        let mut masks = Array2::zeros((n, self.num_values));
        for (i, t) in sampled.iter().enumerate() {
            features.row_mut(i).assign(&t.step.features);
            masks.row_mut(i).assign(&t.step.mask);
        }
        let actions: Vec<usize> = sampled.iter().map(|t| t.step.action).collect();
        let returns: Array1<f64> = sampled.iter().map(|t| t.ret).collect();
        let baseline = returns.mean().unwrap_or(0.0);
        let advantages = returns.mapv(|g| g - baseline);

        let probabilities = policy_probabilities(&self.params, features.view(), masks.view())?;
        let old_probabilities =
            actions.iter().enumerate().map(|(i, &a)| probabilities[[i, a]]).collect();
        Ok(SurrogateData {
            features,
            actions,
            masks,
            advantages,
            old_probabilities,
            l2_regularization: self.options.l2_regularization.value(),
        })
    }
}

fn matrix_view<'a>(
    field: &str, name: &str, tensor: &'a Tensor, expected: [usize; 2],
) -> AgentResult<ArrayView2<'a, f64>> {
    let err = || AgentError::InvalidShape {
        name: format!("{field}[{name}]"),
        expected: expected.to_vec(),
        found: tensor.shape().to_vec(),
    };
    let view = tensor.view().into_dimensionality::<Ix2>().map_err(|_| err())?;
    if view.shape() != &expected[..] {
        return Err(err());
    }
    Ok(view)
}

impl Model for PolicyGradientModel {
    fn experience_capacity(&self) -> usize {
        self.estimator.capacity()
    }

    fn experience(&mut self, batch: &ExperienceBatch) -> AgentResult<Counters> {
        let (features, actions, masks) = self.batch_views(batch)?;
        let completed: Vec<(Step, f64)> = (0..batch.len())
            .flat_map(|t| {
                let step = Step {
                    features: features.row(t).to_owned(),
                    action: actions[t] as usize,
                    mask: masks.row(t).to_owned(),
                };
                self.estimator.push(step, batch.reward[t], batch.terminal[t] > 0)
            })
            .collect();
        for (step, ret) in completed {
            self.remember(Transition { step, ret });
        }
        self.counters.timesteps += batch.len() as u64;
        self.counters.episodes += batch.num_episodes() as u64;
        debug!(self.logger, "experience ingested";
            "timesteps" => batch.len(),
            "memory" => self.memory.len(),
            "pending" => self.estimator.pending_len());
        Ok(self.counters)
    }

    fn update(&mut self) -> AgentResult<Counters> {
        if self.memory.len() < self.options.batch_size {
            debug!(self.logger, "update skipped";
                "memory" => self.memory.len(),
                "batch_size" => self.options.batch_size);
            return Ok(self.counters);
        }
        let data = self.surrogate_data()?;
        let outcome = self.optimizer.step(&Surrogate, &data, &mut self.params)?;
        self.counters.updates += 1;
        info!(self.logger, "policy update";
            "update" => self.counters.updates,
            "accepted" => outcome.accepted,
            "base_value" => outcome.base_value,
            "final_value" => outcome.final_value);
        self.last_step = Some(outcome);
        Ok(self.counters)
    }

    fn counters(&self) -> Counters {
        self.counters
    }
}
