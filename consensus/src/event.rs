//! Events the state machine emits for the surrounding node.

use atria_ledger::Certificate;
use atria_types::BlockHash;
use std::time::Duration;

use crate::proposal::Proposal;
use crate::step::Step;
use crate::vote::Vote;

/// Outbound traffic and notifications, drained by the actor after every
/// state-machine call and handed to the network layer.
#[derive(Clone, Debug)]
pub enum OutboundEvent {
    Vote(Vote),
    Proposal(Proposal),
    BlockCommitted {
        height: u64,
        block_hash: BlockHash,
        certificate: Certificate,
    },
}

/// A scheduled timeout. The ticket is echoed back into the state machine
/// when the timer fires; a ticket whose (height, round, step) no longer
/// matches the machine is stale and ignored, which is what disarms timers
/// across round and height changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeoutTicket {
    pub height: u64,
    pub round: u32,
    pub step: Step,
    pub duration: Duration,
}
