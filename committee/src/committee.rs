//! The active committee: a bounded, ordered validator subset with a rotating
//! proposer.
//!
//! Membership changes apply only at block boundaries via [`Committee::update`],
//! never mid-round. The proposer for round `r` of the current height is the
//! member `r` slots after the height's round-0 proposer, wrapping around the
//! rotation order; after a block commits, rotation continues from the member
//! that follows the proposer who actually committed, so consecutive heights
//! never repeat a proposer deterministically.

use atria_types::{PublicKey, Stake, Validator, ValidatorAddress};
use serde::{Deserialize, Serialize};

use crate::error::CommitteeError;

/// A read-only snapshot of one committee member, handed to the vote pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub number: u32,
    pub address: ValidatorAddress,
    pub public_key: PublicKey,
    pub power: u64,
}

/// The active committee.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Committee {
    /// Members in rotation order.
    members: Vec<Validator>,
    /// Maximum membership, fixed at genesis.
    committee_size: usize,
    /// Index of the round-0 proposer for the current height.
    proposer_index: usize,
}

impl Committee {
    /// Build a committee from an ordered validator list and a known round-0
    /// proposer.
    ///
    /// Fewer validators than `committee_size` is allowed (the committee uses
    /// all available); more is not.
    pub fn new(
        validators: Vec<Validator>,
        committee_size: usize,
        proposer: ValidatorAddress,
    ) -> Result<Self, CommitteeError> {
        if validators.is_empty() {
            return Err(CommitteeError::Empty);
        }
        if validators.len() > committee_size {
            return Err(CommitteeError::OverCapacity(
                validators.len(),
                committee_size,
            ));
        }
        for (i, v) in validators.iter().enumerate() {
            if validators[..i].iter().any(|o| o.address() == v.address()) {
                return Err(CommitteeError::MemberExists(v.address().to_string()));
            }
        }
        let proposer_index = validators
            .iter()
            .position(|v| v.address() == proposer)
            .ok_or_else(|| CommitteeError::ProposerNotMember(proposer.to_string()))?;

        Ok(Self {
            members: validators,
            committee_size,
            proposer_index,
        })
    }

    /// The proposer for the given round of the current height.
    pub fn proposer(&self, round: u32) -> &Validator {
        let index = (self.proposer_index + round as usize) % self.members.len();
        &self.members[index]
    }

    /// Apply the membership changes of a just-finalized block and advance the
    /// rotation past the proposer that committed at `round`.
    ///
    /// `joined` are validators that carried a valid sortition transaction in
    /// the block. Admission fails on duplicates or when more than a third of
    /// the committee would change in a single update; members whose unbonding
    /// height is set are dropped, and the longest-standing members are
    /// evicted while the committee exceeds capacity.
    pub fn update(&mut self, round: u32, joined: Vec<Validator>) -> Result<(), CommitteeError> {
        for (i, v) in joined.iter().enumerate() {
            if self.contains(&v.address()) {
                return Err(CommitteeError::MemberExists(v.address().to_string()));
            }
            if joined[..i].iter().any(|o| o.address() == v.address()) {
                return Err(CommitteeError::DuplicateJoiner(v.address().to_string()));
            }
        }
        let allowed = (self.committee_size / 3).max(1);
        if joined.len() > allowed {
            return Err(CommitteeError::TooManyJoiners {
                joining: joined.len(),
                allowed,
            });
        }

        let committed_proposer = self.proposer(round).address();
        let old_order: Vec<ValidatorAddress> =
            self.members.iter().map(|v| v.address()).collect();
        let old_proposer_pos = self
            .members
            .iter()
            .position(|v| v.address() == committed_proposer)
            .expect("proposer is always a member");

        let mut joined = joined;
        joined.sort_by_key(|v| v.number());
        self.members.extend(joined.clone());

        // Unbonding members leave at the block boundary.
        self.members.retain(|v| !v.has_unbonded());

        // Evict the longest-standing members while over capacity; the
        // committing proposer is protected so rotation has an anchor.
        while self.members.len() > self.committee_size {
            let evict = self
                .members
                .iter()
                .enumerate()
                .filter(|(_, v)| v.address() != committed_proposer)
                .min_by_key(|(_, v)| (v.last_joined_height(), v.number()))
                .map(|(i, _)| i)
                .expect("committee has more than one member");
            self.members.remove(evict);
        }

        // Round 0 of the next height continues rotation from the member that
        // follows the committing proposer: walk the pre-update order (then the
        // joiners) until we find someone still seated.
        let mut successors: Vec<ValidatorAddress> = Vec::new();
        for offset in 1..=old_order.len() {
            successors.push(old_order[(old_proposer_pos + offset) % old_order.len()]);
        }
        successors.extend(joined.iter().map(|v| v.address()));

        self.proposer_index = successors
            .iter()
            .find_map(|addr| self.members.iter().position(|v| v.address() == *addr))
            .unwrap_or(0);

        Ok(())
    }

    pub fn contains(&self, address: &ValidatorAddress) -> bool {
        self.members.iter().any(|v| v.address() == *address)
    }

    /// Member validator numbers in rotation order. This is the committer list
    /// recorded in certificates and used to rebuild the committee on restart.
    pub fn committers(&self) -> Vec<u32> {
        self.members.iter().map(|v| v.number()).collect()
    }

    pub fn members(&self) -> &[Validator] {
        &self.members
    }

    /// Snapshots for the vote pool, in rotation order.
    pub fn member_infos(&self) -> Vec<MemberInfo> {
        self.members
            .iter()
            .map(|v| MemberInfo {
                number: v.number(),
                address: v.address(),
                public_key: v.public_key().clone(),
                power: v.power(),
            })
            .collect()
    }

    /// Summed voting power of the committee.
    pub fn total_power(&self) -> u64 {
        self.members.iter().map(|v| v.power()).sum()
    }

    /// Summed stake of the committee (used for the sortition pool stake).
    pub fn total_stake(&self) -> Stake {
        self.members.iter().map(|v| v.stake()).sum()
    }

    /// Current membership count (≤ capacity).
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Maximum membership.
    pub fn capacity(&self) -> usize {
        self.committee_size
    }
}
