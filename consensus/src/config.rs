//! Consensus timing configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConsensusError;
use crate::step::Step;

/// Per-node consensus tuning.
///
/// Each step has a base timeout; the per-round delta stretches waits at
/// higher rounds so the committee converges under adversarial delay instead
/// of racing through rounds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// How long to wait for a proposal before preparing the undefined hash.
    #[serde(default = "default_propose_timeout_ms")]
    pub propose_timeout_ms: u64,

    /// How long to wait for a prepare quorum before voting to change the
    /// proposer.
    #[serde(default = "default_prepare_timeout_ms")]
    pub prepare_timeout_ms: u64,

    /// How long to wait for a precommit quorum before voting to change the
    /// proposer.
    #[serde(default = "default_precommit_timeout_ms")]
    pub precommit_timeout_ms: u64,

    /// Additional wait per round number, applied to every step timeout.
    #[serde(default = "default_timeout_delta_ms")]
    pub timeout_delta_ms: u64,
}

fn default_propose_timeout_ms() -> u64 {
    3000
}

fn default_prepare_timeout_ms() -> u64 {
    2000
}

fn default_precommit_timeout_ms() -> u64 {
    2000
}

fn default_timeout_delta_ms() -> u64 {
    500
}

impl ConsensusConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ConsensusError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConsensusError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConsensusError> {
        toml::from_str(s).map_err(|e| ConsensusError::Config(e.to_string()))
    }

    /// The timeout for a step at a given round.
    pub fn step_timeout(&self, step: Step, round: u32) -> Duration {
        let base = match step {
            Step::Propose => self.propose_timeout_ms,
            Step::Prepare => self.prepare_timeout_ms,
            _ => self.precommit_timeout_ms,
        };
        Duration::from_millis(base + self.timeout_delta_ms * round as u64)
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            propose_timeout_ms: default_propose_timeout_ms(),
            prepare_timeout_ms: default_prepare_timeout_ms(),
            precommit_timeout_ms: default_precommit_timeout_ms(),
            timeout_delta_ms: default_timeout_delta_ms(),
        }
    }
}
