//! Protocol parameters fixed at genesis.

use serde::{Deserialize, Serialize};

/// Chain-wide parameters every node agrees on.
///
/// These are part of the genesis document and never change at runtime;
/// consensus timeouts, which are per-node tuning, live in
/// `atria-consensus::ConsensusConfig` instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Maximum number of validators in the committee.
    pub committee_size: usize,

    /// Heights a validator must wait after bonding before its stake can
    /// compete in sortition.
    pub bond_interval: u64,

    /// Heights a validator must wait after unbonding before it can withdraw.
    pub unbond_interval: u64,

    /// Block header version emitted by this node.
    pub block_version: u32,

    /// Maximum number of transactions a proposer packs into one block.
    pub max_transactions_per_block: usize,
}

impl ProtocolParams {
    /// Mainnet defaults.
    pub fn mainnet() -> Self {
        Self {
            committee_size: 21,
            bond_interval: 8640, // ~1 day at 10s blocks
            unbond_interval: 181_440, // ~21 days
            block_version: 1,
            max_transactions_per_block: 1000,
        }
    }

    /// Small values suitable for local development networks and tests.
    pub fn dev() -> Self {
        Self {
            committee_size: 4,
            bond_interval: 0,
            unbond_interval: 8,
            block_version: 1,
            max_transactions_per_block: 100,
        }
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self::mainnet()
    }
}
