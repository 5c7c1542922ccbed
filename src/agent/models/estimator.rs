//! Discounted-return estimation.
//!
//! Purpose
//! -------
//! Turn per-step rewards into discounted returns before transitions enter
//! the model's memory, and fix the model's experience capacity.
//!
//! Key behaviors
//! -------------
//! - [`Horizon::Episode`]: returns sum rewards until the episode ends; the
//!   capacity is `max_episode_timesteps`, which is then required.
//! - [`Horizon::Fixed`]: returns sum at most `n` rewards; the capacity is
//!   `n`, and a step completes as soon as `n` rewards are known.
//! - [`ReturnEstimator`] buffers the open episode and hands back finished
//!   `(item, return)` pairs in time order.
//!
//! Invariants & assumptions
//! ------------------------
//! - Returns never bootstrap: an aborted episode (code 2) is cut like a
//!   terminal one.
//! - The pending buffer never exceeds the capacity; an episode that runs
//!   past `max_episode_timesteps` is cut at that point.
use crate::agent::errors::{AgentError, AgentResult};
use std::collections::VecDeque;

/// How far returns look ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    Episode,
    Fixed(usize),
}

/// Return-estimation configuration.
///
/// Default: `Horizon::Episode`, `discount = 0.99`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorOptions {
    pub horizon: Horizon,
    pub discount: f64,
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self { horizon: Horizon::Episode, discount: 0.99 }
    }
}

impl EstimatorOptions {
    /// # Errors
    /// - [`AgentError::InvalidArgument`] if `discount` is outside `[0, 1]` or
    ///   the horizon is `Fixed(0)`.
    pub fn new(horizon: Horizon, discount: f64) -> AgentResult<Self> {
        if !(0.0..=1.0).contains(&discount) {
            return Err(AgentError::InvalidArgument {
                name: "reward_estimation[discount]".to_string(),
                value: discount.to_string(),
                hint: "not in [0, 1]",
            });
        }
        if horizon == Horizon::Fixed(0) {
            return Err(AgentError::InvalidArgument {
                name: "reward_estimation[horizon]".to_string(),
                value: "0".to_string(),
                hint: "< 1",
            });
        }
        Ok(Self { horizon, discount })
    }

    /// Experience capacity implied by the horizon.
    ///
    /// # Errors
    /// - [`AgentError::MissingArgument`] for an episode horizon without
    ///   `max_episode_timesteps`.
    pub fn capacity(&self, max_episode_timesteps: Option<usize>) -> AgentResult<usize> {
        match self.horizon {
            Horizon::Fixed(n) => Ok(n),
            Horizon::Episode => max_episode_timesteps.ok_or(AgentError::MissingArgument {
                name: "max_episode_timesteps".to_string(),
                condition: "reward_estimation[horizon] = \"episode\"",
            }),
        }
    }
}

/// Discounted returns of `rewards`, each summing at most `horizon` terms
/// (`None` = to the end of the slice).
pub fn discounted_returns(rewards: &[f64], discount: f64, horizon: Option<usize>) -> Vec<f64> {
    (0..rewards.len())
        .map(|start| {
            let end = horizon.map_or(rewards.len(), |h| (start + h).min(rewards.len()));
            rewards[start..end].iter().rev().fold(0.0, |acc, &r| r + discount * acc)
        })
        .collect()
}

/// Buffers the open episode and completes returns as rewards arrive.
#[derive(Debug, Clone)]
pub struct ReturnEstimator<T> {
    options: EstimatorOptions,
    capacity: usize,
    pending: VecDeque<(T, f64)>,
}

impl<T> ReturnEstimator<T> {
    pub fn new(
        options: EstimatorOptions, max_episode_timesteps: Option<usize>,
    ) -> AgentResult<Self> {
        let capacity = options.capacity(max_episode_timesteps)?;
        Ok(Self { options, capacity, pending: VecDeque::new() })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Record one step; return the steps whose return is now complete.
    pub fn push(&mut self, item: T, reward: f64, terminal: bool) -> Vec<(T, f64)> {
        self.pending.push_back((item, reward));
        let horizon = match self.options.horizon {
            Horizon::Fixed(n) => Some(n),
            Horizon::Episode => None,
        };
        if terminal || (horizon.is_none() && self.pending.len() >= self.capacity) {
            return self.complete(self.pending.len(), horizon);
        }
        match horizon {
            Some(n) if self.pending.len() >= n => {
                self.complete(self.pending.len() + 1 - n, horizon)
            }
            _ => Vec::new(),
        }
    }

    /// Complete the first `count` pending steps.
    fn complete(&mut self, count: usize, horizon: Option<usize>) -> Vec<(T, f64)> {
        let rewards: Vec<f64> = self.pending.iter().map(|(_, r)| *r).collect();
        let returns = discounted_returns(&rewards, self.options.discount, horizon);
        self.pending.drain(..count).zip(returns).map(|((item, _), ret)| (item, ret)).collect()
    }
}
