use serde::{Deserialize, Serialize};

/// Progress counters reported by a model after every ingestion or update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub timesteps: u64,
    pub episodes: u64,
    pub updates: u64,
}

impl Counters {
    pub fn new(timesteps: u64, episodes: u64, updates: u64) -> Self {
        Self { timesteps, episodes, updates }
    }
}
