//! Consensus votes.

use atria_crypto::{verify_signature, Signer};
use atria_types::{BlockHash, PublicKey, Signature, ValidatorAddress};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConsensusError;

/// The kind of vote.
///
/// `ChangeProposer` votes always carry the undefined hash; they are cast on
/// step timeouts and drive the round-change quorum without conflicting with a
/// precommit the voter may already have cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteType {
    Prepare,
    Precommit,
    ChangeProposer,
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VoteType::Prepare => "prepare",
            VoteType::Precommit => "precommit",
            VoteType::ChangeProposer => "change-proposer",
        };
        write!(f, "{name}")
    }
}

/// The signed portion of a vote.
#[derive(Serialize)]
struct VoteSignBytes<'a> {
    vote_type: VoteType,
    height: u64,
    round: u32,
    block_hash: &'a BlockHash,
    signer: &'a ValidatorAddress,
}

/// A signed vote for a (height, round, step) slot.
///
/// Identity is (height, round, type, signer): a second vote in the same slot
/// with a different hash is equivocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    vote_type: VoteType,
    height: u64,
    round: u32,
    /// The voted block hash, or [`BlockHash::UNDEF`] for the change marker.
    block_hash: BlockHash,
    signer: ValidatorAddress,
    signature: Signature,
}

impl Vote {
    /// Build and sign a vote.
    pub fn sign_new(
        vote_type: VoteType,
        height: u64,
        round: u32,
        block_hash: BlockHash,
        signer: &Signer,
    ) -> Self {
        let address = signer.address();
        let bytes = sign_bytes(vote_type, height, round, &block_hash, &address);
        Self {
            vote_type,
            height,
            round,
            block_hash,
            signer: address,
            signature: signer.sign(&bytes),
        }
    }

    pub fn vote_type(&self) -> VoteType {
        self.vote_type
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn block_hash(&self) -> &BlockHash {
        &self.block_hash
    }

    pub fn signer(&self) -> &ValidatorAddress {
        &self.signer
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Verify the signature against the claimed signer's public key.
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        let bytes = sign_bytes(
            self.vote_type,
            self.height,
            self.round,
            &self.block_hash,
            &self.signer,
        );
        verify_signature(&bytes, &self.signature, public_key)
    }

    /// Structural validation independent of committee state.
    pub fn sanity_check(&self) -> Result<(), ConsensusError> {
        if self.height == 0 {
            return Err(ConsensusError::InvalidVote("height must be positive".into()));
        }
        if self.vote_type == VoteType::ChangeProposer && !self.block_hash.is_undef() {
            return Err(ConsensusError::InvalidVote(
                "change-proposer vote must be for the undefined hash".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}/{}/{} {:?} by {}}}",
            self.height, self.round, self.vote_type, self.block_hash, self.signer
        )
    }
}

fn sign_bytes(
    vote_type: VoteType,
    height: u64,
    round: u32,
    block_hash: &BlockHash,
    signer: &ValidatorAddress,
) -> Vec<u8> {
    bincode::serialize(&VoteSignBytes {
        vote_type,
        height,
        round,
        block_hash,
        signer,
    })
    .expect("vote sign bytes are always serializable")
}
