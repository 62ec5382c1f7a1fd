//! Height/round/step BFT consensus for the Atria validator node.
//!
//! The committee agrees on one block per height through a sequence of rounds;
//! each round walks Propose → Prepare → Precommit, finalizing on a precommit
//! quorum for a concrete block hash and retrying with the next proposer on a
//! quorum for the undefined marker.
//!
//! ## Module overview
//!
//! - [`consensus`] — the state machine driving height/round/step transitions.
//! - [`actor`] — the tokio task that owns the machine and serializes inputs.
//! - [`vote`] / [`vote_pool`] — signed votes, quorum detection, equivocation
//!   evidence, certificate building.
//! - [`proposal`] — signed block proposals.
//! - [`config`] — step timeout tuning.
//! - [`traits`] — external executor and transaction-source interfaces.
//! - [`event`] — outbound events and timeout tickets.
//! - [`step`] / [`error`] — shared enums and error types.

pub mod actor;
pub mod config;
pub mod consensus;
pub mod error;
pub mod event;
pub mod proposal;
pub mod step;
pub mod traits;
pub mod vote;
pub mod vote_pool;

pub use actor::{spawn, ConsensusHandle};
pub use config::ConsensusConfig;
pub use consensus::{Consensus, ConsensusSnapshot, METRICS};
pub use error::ConsensusError;
pub use event::{OutboundEvent, TimeoutTicket};
pub use proposal::Proposal;
pub use step::Step;
pub use traits::{ExecutionOutcome, Executor, ExecutorError, TxSource};
pub use vote::{Vote, VoteType};
pub use vote_pool::VotePool;
