//! The height/round/step consensus state machine.
//!
//! One instance runs as a single logical sequential actor per node (see
//! [`crate::actor`]). Every public entry point takes `&mut self`; timers,
//! inbound votes, and proposals are independent producers feeding this one
//! owner, so step-ordering invariants never race.
//!
//! Outbound traffic accumulates in an outbox and timeout requests in a timer
//! queue; the caller drains both after every call. Timeout tickets carry the
//! (height, round, step) they were armed for and are ignored once the machine
//! has moved on, which is what atomically disarms stale timers on round and
//! height changes.

use std::sync::Arc;

use atria_committee::Committee;
use atria_crypto::Signer;
use atria_ledger::{Block, BlockHeader};
use atria_sortition::{Sortition, VerifiableSeed};
use atria_state::LastInfo;
use atria_store::Store;
use atria_types::{BlockHash, ProtocolParams, Timestamp, ValidatorAddress};
use atria_utils::StatsCounter;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::ConsensusConfig;
use crate::error::ConsensusError;
use crate::event::{OutboundEvent, TimeoutTicket};
use crate::proposal::Proposal;
use crate::step::Step;
use crate::traits::{Executor, TxSource};
use crate::vote::{Vote, VoteType};
use crate::vote_pool::VotePool;

/// Counter names the engine reports on.
pub const METRICS: &[&str] = &[
    "votes_accepted",
    "votes_rejected",
    "votes_cast",
    "equivocations",
    "proposals_created",
    "proposals_rejected",
    "rounds_changed",
    "timeouts_fired",
    "blocks_committed",
];

/// A consistent, copyable view of the machine for external readers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusSnapshot {
    pub height: u64,
    pub round: u32,
    pub step: Step,
    pub proposer: ValidatorAddress,
    pub committers: Vec<u32>,
    pub total_power: u64,
}

/// The consensus engine.
pub struct Consensus {
    config: ConsensusConfig,
    signer: Signer,
    params: ProtocolParams,
    committee: Committee,
    sortition: Sortition,
    last_info: LastInfo,
    store: Arc<dyn Store>,
    executor: Box<dyn Executor>,
    tx_source: Box<dyn TxSource>,
    metrics: Arc<StatsCounter>,

    height: u64,
    round: u32,
    step: Step,
    pool: VotePool,
    /// Validated proposals of the current height, by round.
    proposals: BTreeMap<u32, Proposal>,
    outbox: Vec<OutboundEvent>,
    timeouts: Vec<TimeoutTicket>,
}

impl Consensus {
    /// A counter collection covering every metric the engine emits.
    pub fn default_metrics() -> StatsCounter {
        StatsCounter::new(METRICS)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ConsensusConfig,
        signer: Signer,
        params: ProtocolParams,
        committee: Committee,
        sortition: Sortition,
        last_info: LastInfo,
        store: Arc<dyn Store>,
        executor: Box<dyn Executor>,
        tx_source: Box<dyn TxSource>,
        metrics: Arc<StatsCounter>,
    ) -> Self {
        let pool = VotePool::new(0, committee.member_infos());
        Self {
            config,
            signer,
            params,
            committee,
            sortition,
            last_info,
            store,
            executor,
            tx_source,
            metrics,
            height: 0,
            round: 0,
            step: Step::NewHeight,
            pool,
            proposals: BTreeMap::new(),
            outbox: Vec::new(),
            timeouts: Vec::new(),
        }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn vote_pool(&self) -> &VotePool {
        &self.pool
    }

    pub fn snapshot(&self) -> ConsensusSnapshot {
        ConsensusSnapshot {
            height: self.height,
            round: self.round,
            step: self.step,
            proposer: self.committee.proposer(self.round).address(),
            committers: self.committee.committers(),
            total_power: self.committee.total_power(),
        }
    }

    /// Drain pending outbound events.
    pub fn take_outbox(&mut self) -> Vec<OutboundEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Drain pending timeout requests.
    pub fn take_timeouts(&mut self) -> Vec<TimeoutTicket> {
        std::mem::take(&mut self.timeouts)
    }

    /// Arm the machine at the height following the last finalized block.
    /// Idempotent: calling while already at that height does nothing.
    pub fn move_to_new_height(&mut self) {
        if self.height != self.last_info.block_height() + 1 {
            self.enter_new_height();
        }
    }

    /// Feed an inbound (or own) vote.
    ///
    /// Malformed, stale, non-committee, and equivocating votes are rejected
    /// and logged but never fatal; only a commit-path inconsistency escapes
    /// as an error.
    pub fn add_vote(&mut self, vote: Vote) -> Result<(), ConsensusError> {
        if let Err(e) = vote.sanity_check() {
            warn!(error = %e, "malformed vote rejected");
            self.metrics.increment("votes_rejected");
            return Ok(());
        }
        if vote.height() != self.height {
            // Expected under partial synchrony; block sync owns catching up.
            debug!(
                vote_height = vote.height(),
                height = self.height,
                "vote for another height dropped"
            );
            return Ok(());
        }

        match self.pool.add_vote(&vote) {
            Ok(true) => {
                self.metrics.increment("votes_accepted");
                self.check_progress()
            }
            Ok(false) => Ok(()),
            Err(e @ ConsensusError::Equivocation { .. }) => {
                warn!(error = %e, "equivocating vote rejected, evidence retained");
                self.metrics.increment("equivocations");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "vote rejected");
                self.metrics.increment("votes_rejected");
                Ok(())
            }
        }
    }

    /// Feed an inbound proposal.
    ///
    /// An invalid proposal is rejected and logged but does not itself trigger
    /// a round change — only timeout or quorum movement does.
    pub fn set_proposal(&mut self, proposal: Proposal) -> Result<(), ConsensusError> {
        if proposal.height() != self.height {
            debug!(
                proposal_height = proposal.height(),
                height = self.height,
                "proposal for another height dropped"
            );
            return Ok(());
        }
        if self.proposals.contains_key(&proposal.round()) {
            debug!(round = proposal.round(), "duplicate proposal dropped");
            return Ok(());
        }
        if let Err(e) = self.validate_proposal(&proposal) {
            warn!(error = %e, round = proposal.round(), "invalid proposal rejected");
            self.metrics.increment("proposals_rejected");
            return Ok(());
        }

        debug!(
            round = proposal.round(),
            hash = %proposal.block_hash(),
            "proposal accepted"
        );
        let round = proposal.round();
        let hash = proposal.block_hash();
        self.proposals.insert(round, proposal);

        if round == self.round && self.step == Step::Propose {
            self.enter_prepare(hash);
        }
        self.check_progress()
    }

    /// Handle a fired timeout. Tickets for a (height, round, step) the
    /// machine already left are no-ops.
    pub fn on_timeout(&mut self, ticket: TimeoutTicket) -> Result<(), ConsensusError> {
        if ticket.height != self.height
            || ticket.round != self.round
            || ticket.step != self.step
        {
            return Ok(());
        }
        self.metrics.increment("timeouts_fired");
        debug!(height = self.height, round = self.round, step = %self.step, "step timed out");

        match self.step {
            // No valid proposal in time: prepare the undefined hash.
            Step::Propose => self.enter_prepare(BlockHash::UNDEF),
            // No quorum in time: vote to change the proposer. The round
            // advances only once enough peers agree.
            Step::Prepare | Step::Precommit => {
                self.cast_vote(VoteType::ChangeProposer, BlockHash::UNDEF);
            }
            _ => {}
        }
        self.check_progress()
    }

    // ── Transitions ─────────────────────────────────────────────────────

    fn enter_new_height(&mut self) {
        self.height = self.last_info.block_height() + 1;
        self.round = 0;
        self.step = Step::NewHeight;
        self.pool = VotePool::new(self.height, self.committee.member_infos());
        self.proposals.clear();
        debug!(height = self.height, "entering new height");
        self.enter_propose();
    }

    fn enter_new_round(&mut self, round: u32) {
        if round <= self.round {
            return;
        }
        self.round = round;
        self.step = Step::NewHeight;
        self.metrics.increment("rounds_changed");
        info!(height = self.height, round, "entering new round");
        self.enter_propose();
    }

    fn enter_propose(&mut self) {
        self.step = Step::Propose;
        self.schedule_timeout(Step::Propose);

        let proposer = self.committee.proposer(self.round).address();
        debug!(
            height = self.height,
            round = self.round,
            proposer = %proposer,
            "entering propose step"
        );

        if proposer == self.signer.address() {
            match self.create_proposal() {
                Ok(proposal) => {
                    let hash = proposal.block_hash();
                    self.outbox.push(OutboundEvent::Proposal(proposal.clone()));
                    self.proposals.insert(self.round, proposal);
                    self.metrics.increment("proposals_created");
                    self.enter_prepare(hash);
                }
                Err(e) => warn!(error = %e, "unable to build a proposal"),
            }
        } else if let Some(proposal) = self.proposals.get(&self.round) {
            // The proposal for this round arrived while we were behind.
            let hash = proposal.block_hash();
            self.enter_prepare(hash);
        }
    }

    fn enter_prepare(&mut self, hash: BlockHash) {
        self.step = Step::Prepare;
        self.schedule_timeout(Step::Prepare);
        self.cast_vote(VoteType::Prepare, hash);
    }

    fn enter_precommit(&mut self, hash: BlockHash) {
        self.step = Step::Precommit;
        self.schedule_timeout(Step::Precommit);
        self.cast_vote(VoteType::Precommit, hash);
    }

    /// Finalize the block that won a precommit quorum at the current round.
    fn enter_commit(&mut self, hash: BlockHash) -> Result<(), ConsensusError> {
        self.step = Step::Commit;

        let proposal = self
            .proposals
            .get(&self.round)
            .cloned()
            .expect("commit requires the current round's proposal");
        let block = proposal.block().clone();
        let certificate = self.pool.build_certificate(self.round)?;
        debug_assert_eq!(*certificate.block_hash(), hash);

        let height = self.height;
        self.store.save_block(height, &block)?;
        let outcome = self
            .executor
            .execute(&block)
            .map_err(|e| ConsensusError::Executor(e.to_string()))?;
        self.last_info.update(height, &block, certificate.clone());
        self.last_info.save(self.store.as_ref())?;
        self.store.write_batch()?;

        // Advance committee and sortition state for the next height.
        self.committee
            .update(certificate.round(), outcome.joined_committee)?;
        let pool_stake = outcome
            .total_stake
            .saturating_sub(self.committee.total_stake());
        self.sortition
            .set_params(block.hash(), block.header().sortition_seed, pool_stake);

        self.metrics.increment("blocks_committed");
        info!(height, hash = %block.hash(), round = certificate.round(), "block committed");
        self.outbox.push(OutboundEvent::BlockCommitted {
            height,
            block_hash: block.hash(),
            certificate,
        });

        self.enter_new_height();
        Ok(())
    }

    /// Re-evaluate quorums until the machine stops moving.
    fn check_progress(&mut self) -> Result<(), ConsensusError> {
        loop {
            let before = (self.height, self.round, self.step);
            self.try_advance()?;
            if (self.height, self.round, self.step) == before {
                return Ok(());
            }
        }
    }

    /// A single quorum-driven transition, if one is available.
    fn try_advance(&mut self) -> Result<(), ConsensusError> {
        // Precommit quorum at the current round: commit on a concrete hash,
        // change rounds on the undefined marker.
        if let Some(hash) = self.pool.has_quorum(self.round, VoteType::Precommit) {
            if hash.is_undef() {
                self.enter_new_round(self.round + 1);
                return Ok(());
            }
            let have_block = self
                .proposals
                .get(&self.round)
                .map(|p| p.block_hash() == hash)
                .unwrap_or(false);
            if have_block {
                return self.enter_commit(hash);
            }
            debug!(%hash, "precommit quorum without the proposed block, waiting");
        }

        // Prepare quorum advances Prepare → Precommit, voting for whatever
        // hash won (the undefined marker included).
        if self.step == Step::Prepare {
            if let Some(hash) = self.pool.has_quorum(self.round, VoteType::Prepare) {
                self.enter_precommit(hash);
                return Ok(());
            }
        }

        // Round change: enough peers at or ahead of our round agreed to move
        // on. A quorum entirely at a future round jumps us straight past it.
        for round in self.pool.round_numbers() {
            if round < self.round {
                continue;
            }
            let precommit_undef = self
                .pool
                .has_quorum(round, VoteType::Precommit)
                .map_or(false, |h| h.is_undef());
            if precommit_undef || self.pool.has_quorum(round, VoteType::ChangeProposer).is_some()
            {
                self.enter_new_round(round + 1);
                return Ok(());
            }
        }

        Ok(())
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    /// The seed the next block must carry, given the certificate it embeds.
    fn expected_seed(&self, embedded: Option<&atria_ledger::Certificate>) -> VerifiableSeed {
        match embedded {
            Some(cert) => self.last_info.sortition_seed().next(&cert.hash()),
            None => *self.last_info.sortition_seed(),
        }
    }

    fn create_proposal(&mut self) -> Result<Proposal, ConsensusError> {
        let transactions = self.tx_source.poll_transactions(self.height);
        let mut tx_ids = Vec::with_capacity(transactions.len());
        for tx in transactions.iter().take(self.params.max_transactions_per_block) {
            // Bodies must be durable before a block referencing them can
            // commit; peers fetch them through sync.
            self.store.save_transaction(tx)?;
            tx_ids.push(tx.id());
        }

        let prev_certificate = self.last_info.certificate().cloned();
        let prev_cert_hash = prev_certificate
            .as_ref()
            .map(|c| c.hash())
            .unwrap_or(BlockHash::UNDEF);
        let sortition_seed = self.expected_seed(prev_certificate.as_ref());

        let header = BlockHeader {
            version: self.params.block_version,
            height: self.height,
            time: Timestamp::now(),
            prev_block_hash: *self.last_info.block_hash(),
            sortition_seed,
            proposer_address: self.signer.address(),
            prev_cert_hash,
        };
        let block = Block::new(header, prev_certificate, tx_ids);
        Ok(Proposal::sign_new(self.height, self.round, block, &self.signer))
    }

    fn validate_proposal(&self, proposal: &Proposal) -> Result<(), ConsensusError> {
        let block = proposal.block();
        block
            .sanity_check()
            .map_err(|e| ConsensusError::InvalidProposal(e.to_string()))?;

        let header = block.header();
        if header.height != proposal.height() {
            return Err(ConsensusError::InvalidProposal(
                "header height mismatch".into(),
            ));
        }
        if header.prev_block_hash != *self.last_info.block_hash() {
            return Err(ConsensusError::InvalidProposal(
                "does not extend the last block".into(),
            ));
        }
        let proposer = self.committee.proposer(proposal.round());
        if header.proposer_address != proposer.address() {
            return Err(ConsensusError::InvalidProposal(format!(
                "wrong proposer, expected {}",
                proposer.address()
            )));
        }
        if header.sortition_seed != self.expected_seed(block.prev_certificate()) {
            return Err(ConsensusError::InvalidProposal(
                "sortition seed does not chain from the previous block".into(),
            ));
        }
        if !proposal.verify(proposer.public_key()) {
            return Err(ConsensusError::InvalidProposal(
                "invalid proposer signature".into(),
            ));
        }
        Ok(())
    }

    /// Sign and record our own vote, then queue it for broadcast. Committee
    /// outsiders observe without voting; an already-cast slot is left alone.
    fn cast_vote(&mut self, vote_type: VoteType, hash: BlockHash) {
        if !self.committee.contains(&self.signer.address()) {
            return;
        }
        if self
            .pool
            .has_voted(self.round, vote_type, &self.signer.address())
        {
            return;
        }

        let vote = Vote::sign_new(vote_type, self.height, self.round, hash, &self.signer);
        match self.pool.add_vote(&vote) {
            Ok(_) => {
                debug!(vote = %vote, "vote cast");
                self.metrics.increment("votes_cast");
                self.outbox.push(OutboundEvent::Vote(vote));
            }
            Err(e) => warn!(error = %e, "own vote rejected"),
        }
    }

    fn schedule_timeout(&mut self, step: Step) {
        self.timeouts.push(TimeoutTicket {
            height: self.height,
            round: self.round,
            step,
            duration: self.config.step_timeout(step, self.round),
        });
    }
}
