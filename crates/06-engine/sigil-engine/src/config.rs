use dispatcher::DispatchConfig;
use reinforcement::ReinforcementConfig;
use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dispatch: DispatchConfig,
    pub reinforcement: ReinforcementConfig,
    /// Run a reinforcement pass every this many ticks. Zero disables automatic passes.
    pub reinforce_every: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            reinforcement: ReinforcementConfig::default(),
            reinforce_every: 10,
        }
    }
}
