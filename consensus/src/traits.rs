//! External collaborator interfaces.
//!
//! Transaction execution and mempool management live outside the consensus
//! core; the state machine reaches them only through these traits.

use atria_ledger::Block;
use atria_transactions::Transaction;
use atria_types::{Stake, Validator};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ExecutorError(pub String);

/// What the external executor reports back after applying a finalized block.
/// The consensus core only consumes the validator deltas it needs for
/// committee rotation and sortition pool accounting.
pub struct ExecutionOutcome {
    /// Validators admitted by valid sortition transactions in the block.
    pub joined_committee: Vec<Validator>,
    /// Total active stake after execution.
    pub total_stake: Stake,
}

/// Applies finalized blocks: executes transactions (bond, unbond, sortition,
/// transfers), persists their effects, and reports the outcome.
pub trait Executor: Send {
    fn execute(&self, block: &Block) -> Result<ExecutionOutcome, ExecutorError>;
}

/// Supplies transactions for a block this node is about to propose.
pub trait TxSource: Send {
    fn poll_transactions(&self, height: u64) -> Vec<Transaction>;
}
