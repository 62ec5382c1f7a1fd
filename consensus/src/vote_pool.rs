//! Per-height vote pool and certificate builder.
//!
//! The pool holds one committee snapshot, taken when the height was entered,
//! and collects votes for every round of that height — future rounds
//! included, since a silent minority must not stall a majority that has
//! already moved on. Quorum detection is a weight computation over the
//! recorded set and is independent of arrival order.

use std::collections::{BTreeMap, HashMap};

use atria_committee::MemberInfo;
use atria_ledger::Certificate;
use atria_types::{BlockHash, ValidatorAddress};

use crate::error::ConsensusError;
use crate::vote::{Vote, VoteType};

/// Votes of one (round, type) slot.
#[derive(Default)]
struct VoteSet {
    /// Accepted vote per signer.
    votes: HashMap<ValidatorAddress, Vote>,
    /// Accumulated power per candidate hash (the undefined marker is a
    /// candidate of its own).
    tally: HashMap<BlockHash, u64>,
    /// Conflicting vote pairs, retained as equivocation evidence.
    evidence: Vec<(Vote, Vote)>,
}

#[derive(Default)]
struct RoundVotes {
    prepares: VoteSet,
    precommits: VoteSet,
    change_proposers: VoteSet,
}

impl RoundVotes {
    fn set(&self, vote_type: VoteType) -> &VoteSet {
        match vote_type {
            VoteType::Prepare => &self.prepares,
            VoteType::Precommit => &self.precommits,
            VoteType::ChangeProposer => &self.change_proposers,
        }
    }

    fn set_mut(&mut self, vote_type: VoteType) -> &mut VoteSet {
        match vote_type {
            VoteType::Prepare => &mut self.prepares,
            VoteType::Precommit => &mut self.precommits,
            VoteType::ChangeProposer => &mut self.change_proposers,
        }
    }
}

/// The vote pool for one height.
pub struct VotePool {
    height: u64,
    members: Vec<MemberInfo>,
    total_power: u64,
    rounds: BTreeMap<u32, RoundVotes>,
}

impl VotePool {
    /// Create a pool over a committee snapshot (rotation order preserved).
    pub fn new(height: u64, members: Vec<MemberInfo>) -> Self {
        let total_power = members.iter().map(|m| m.power).sum();
        Self {
            height,
            members,
            total_power,
            rounds: BTreeMap::new(),
        }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn total_power(&self) -> u64 {
        self.total_power
    }

    fn member(&self, address: &ValidatorAddress) -> Option<&MemberInfo> {
        self.members.iter().find(|m| m.address == *address)
    }

    /// Record a vote.
    ///
    /// Returns `Ok(true)` if the vote was added, `Ok(false)` for an exact
    /// duplicate. Rejects votes from outside the committee snapshot, votes
    /// with invalid signatures, votes for the wrong height, and conflicting
    /// second votes (equivocation) — the conflicting pair is retained as
    /// evidence and the call fails.
    pub fn add_vote(&mut self, vote: &Vote) -> Result<bool, ConsensusError> {
        if vote.height() != self.height {
            return Err(ConsensusError::InvalidVote(format!(
                "vote for height {} in pool for height {}",
                vote.height(),
                self.height
            )));
        }
        let member = self
            .member(vote.signer())
            .ok_or_else(|| ConsensusError::NonCommitteeVoter(vote.signer().to_string()))?;
        if !vote.verify(&member.public_key) {
            return Err(ConsensusError::InvalidVote("invalid signature".into()));
        }
        let power = member.power;

        let set = self
            .rounds
            .entry(vote.round())
            .or_default()
            .set_mut(vote.vote_type());

        if let Some(existing) = set.votes.get(vote.signer()) {
            if existing.block_hash() == vote.block_hash() {
                return Ok(false);
            }
            set.evidence.push((existing.clone(), vote.clone()));
            return Err(ConsensusError::Equivocation {
                signer: vote.signer().to_string(),
                height: vote.height(),
                round: vote.round(),
            });
        }

        set.votes.insert(*vote.signer(), vote.clone());
        *set.tally.entry(*vote.block_hash()).or_insert(0) += power;
        Ok(true)
    }

    /// Whether a signer already voted in a (round, type) slot.
    pub fn has_voted(&self, round: u32, vote_type: VoteType, signer: &ValidatorAddress) -> bool {
        self.rounds
            .get(&round)
            .map(|r| r.set(vote_type).votes.contains_key(signer))
            .unwrap_or(false)
    }

    /// The hash holding a quorum in a (round, type) slot, if any.
    ///
    /// Quorum is strictly greater than 2/3 of the committee's total power;
    /// the undefined marker is evaluated as its own candidate. At most one
    /// hash can hold a quorum, since each signer votes once per slot.
    pub fn has_quorum(&self, round: u32, vote_type: VoteType) -> Option<BlockHash> {
        let set = self.rounds.get(&round)?.set(vote_type);
        set.tally
            .iter()
            .find(|(_, power)| self.is_quorum(**power))
            .map(|(hash, _)| *hash)
    }

    fn is_quorum(&self, power: u64) -> bool {
        // Strictly greater than 2/3 of total power, without division.
        3 * power > 2 * self.total_power
    }

    /// Accumulated power for a specific candidate hash.
    pub fn power_for(&self, round: u32, vote_type: VoteType, hash: &BlockHash) -> u64 {
        self.rounds
            .get(&round)
            .and_then(|r| r.set(vote_type).tally.get(hash))
            .copied()
            .unwrap_or(0)
    }

    /// All accepted votes in a (round, type) slot.
    pub fn votes(&self, round: u32, vote_type: VoteType) -> Vec<&Vote> {
        self.rounds
            .get(&round)
            .map(|r| r.set(vote_type).votes.values().collect())
            .unwrap_or_default()
    }

    /// Retained equivocation evidence for a (round, type) slot.
    pub fn evidence(&self, round: u32, vote_type: VoteType) -> &[(Vote, Vote)] {
        self.rounds
            .get(&round)
            .map(|r| r.set(vote_type).evidence.as_slice())
            .unwrap_or(&[])
    }

    /// Round numbers with any recorded votes.
    pub fn round_numbers(&self) -> Vec<u32> {
        self.rounds.keys().copied().collect()
    }

    /// Build the certificate for a precommit quorum on a concrete hash.
    ///
    /// Snapshots signer indices and signatures at call time; the certificate
    /// is immutable thereafter. An established quorum whose signatures do not
    /// add up is an internal inconsistency between the quorum check and the
    /// builder — surfaced as a fatal error, never silently repaired.
    pub fn build_certificate(&self, round: u32) -> Result<Certificate, ConsensusError> {
        let hash = self
            .has_quorum(round, VoteType::Precommit)
            .filter(|h| !h.is_undef())
            .ok_or(ConsensusError::NoQuorum {
                height: self.height,
                round,
            })?;

        let set = self
            .rounds
            .get(&round)
            .expect("quorum implies recorded votes")
            .set(VoteType::Precommit);

        let mut committers = Vec::with_capacity(self.members.len());
        let mut absentees = Vec::new();
        let mut signatures = Vec::new();
        let mut signed_power = 0u64;
        for member in &self.members {
            committers.push(member.number);
            match set.votes.get(&member.address) {
                Some(vote) if *vote.block_hash() == hash => {
                    signatures.push(vote.signature().clone());
                    signed_power += member.power;
                }
                _ => absentees.push(member.number),
            }
        }

        if !self.is_quorum(signed_power) {
            return Err(ConsensusError::CertificateInvariant(format!(
                "quorum reported but signers hold {}/{} power",
                signed_power, self.total_power
            )));
        }

        Ok(Certificate::new(
            self.height,
            round,
            hash,
            committers,
            absentees,
            signatures,
        ))
    }
}
