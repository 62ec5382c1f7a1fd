//! Block certificate — the quorum proof for a (height, round).

use atria_crypto::hash_block;
use atria_types::{BlockHash, Signature};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Proof that a block was agreed upon at a given round.
///
/// `committers` lists every committee member number in rotation order at the
/// time of the quorum; `absentees` are the committers whose precommit was not
/// observed. `signatures` are the precommit signatures of the non-absent
/// committers, in committer order. A certificate is immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    height: u64,
    round: u32,
    block_hash: BlockHash,
    committers: Vec<u32>,
    absentees: Vec<u32>,
    signatures: Vec<Signature>,
}

impl Certificate {
    pub fn new(
        height: u64,
        round: u32,
        block_hash: BlockHash,
        committers: Vec<u32>,
        absentees: Vec<u32>,
        signatures: Vec<Signature>,
    ) -> Self {
        Self {
            height,
            round,
            block_hash,
            committers,
            absentees,
            signatures,
        }
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

    /// Every committee member number, in rotation order.
    pub fn committers(&self) -> &[u32] {
        &self.committers
    }

    pub fn absentees(&self) -> &[u32] {
        &self.absentees
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Committer numbers that actually signed, in rotation order.
    pub fn signers(&self) -> Vec<u32> {
        self.committers
            .iter()
            .copied()
            .filter(|n| !self.absentees.contains(n))
            .collect()
    }

    /// Hash of the certificate; feeds the sortition seed chain.
    pub fn hash(&self) -> BlockHash {
        let bytes =
            bincode::serialize(self).expect("certificate is always serializable");
        hash_block(&bytes)
    }

    /// Structural validation.
    pub fn sanity_check(&self) -> Result<(), LedgerError> {
        if self.block_hash.is_undef() {
            return Err(LedgerError::InvalidCertificate(
                "certificate for undefined block hash".into(),
            ));
        }
        if self.committers.is_empty() {
            return Err(LedgerError::InvalidCertificate("no committers".into()));
        }
        for a in &self.absentees {
            if !self.committers.contains(a) {
                return Err(LedgerError::InvalidCertificate(format!(
                    "absentee {a} is not a committer"
                )));
            }
        }
        let expected = self.committers.len() - self.absentees.len();
        if self.signatures.len() != expected {
            return Err(LedgerError::InvalidCertificate(format!(
                "{} signatures for {} signers",
                self.signatures.len(),
                expected
            )));
        }
        Ok(())
    }
}
