//! Sortition engine — evaluate/verify plus the recent-parameters window.
//!
//! The engine itself is a pure verifier. The only state it carries is a small
//! ring buffer of `(block_hash, seed, pool_stake)` triples, one per recent
//! height: a proof references the seed and pool snapshot of the height it
//! targets, and proofs may arrive a few blocks late, so verification must use
//! the historically correct snapshot rather than the current one.

use atria_crypto::{verify_signature, Signer};
use atria_types::{BlockHash, PublicKey, Stake, Validator};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;

use crate::proof::SortitionProof;
use crate::seed::VerifiableSeed;

/// Number of recent heights whose sortition parameters are retained.
pub const SORTITION_WINDOW: usize = 7;

/// Sortition parameters for one height.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortitionParams {
    pub block_hash: BlockHash,
    pub seed: VerifiableSeed,
    /// Total active stake minus the stake of current committee members
    /// (committee members do not re-compete for slots).
    pub pool_stake: Stake,
}

/// Evaluate sortition for a validator against a seed.
///
/// Returns a proof only if the validator won a slot; otherwise `None`. The
/// proof is deterministic for a given (seed, key) pair, so re-evaluating the
/// same height never yields a different outcome.
pub fn evaluate(
    seed: &VerifiableSeed,
    signer: &Signer,
    stake: Stake,
    pool_stake: Stake,
) -> Option<SortitionProof> {
    let proof = SortitionProof::new(signer.sign(seed.as_bytes()));
    if meets_threshold(proof_score(&proof), stake, pool_stake) {
        Some(proof)
    } else {
        None
    }
}

/// Verify a sortition proof against a seed and the stake snapshot the proof
/// targets.
pub fn verify(
    seed: &VerifiableSeed,
    proof: &SortitionProof,
    public_key: &PublicKey,
    stake: Stake,
    pool_stake: Stake,
) -> bool {
    if !verify_signature(seed.as_bytes(), proof.signature(), public_key) {
        return false;
    }
    meets_threshold(proof_score(proof), stake, pool_stake)
}

/// Map a proof to a uniform 64-bit score.
fn proof_score(proof: &SortitionProof) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(proof.as_bytes());
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

/// Threshold check: accept with probability `stake / pool_stake`.
///
/// `score` is uniform in `[0, 2^64)`; the proof wins iff
/// `score * pool_stake < stake * 2^64`, all in 128-bit arithmetic.
fn meets_threshold(score: u64, stake: Stake, pool_stake: Stake) -> bool {
    if pool_stake == 0 {
        // Empty pool: nothing competes, any proof wins.
        return true;
    }
    (score as u128) * (pool_stake as u128) < (stake as u128) << 64
}

/// The sortition engine: threshold verifier plus the parameters window.
#[derive(Clone, Debug, Default)]
pub struct Sortition {
    window: VecDeque<SortitionParams>,
}

impl Sortition {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(SORTITION_WINDOW),
        }
    }

    /// Record the parameters of a newly committed block, evicting the oldest
    /// entry once the window is full. Entries must be fed oldest-first.
    pub fn set_params(&mut self, block_hash: BlockHash, seed: VerifiableSeed, pool_stake: Stake) {
        if self.window.len() == SORTITION_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(SortitionParams {
            block_hash,
            seed,
            pool_stake,
        });
    }

    /// Look up the parameters recorded for a block, if still in the window.
    pub fn params(&self, block_hash: &BlockHash) -> Option<&SortitionParams> {
        self.window.iter().find(|p| p.block_hash == *block_hash)
    }

    /// Verify a proof that targets the height identified by `block_hash`.
    ///
    /// Returns `false` if the block has left the window — a proof that stale
    /// is no longer admissible.
    pub fn verify_proof(
        &self,
        block_hash: &BlockHash,
        proof: &SortitionProof,
        validator: &Validator,
    ) -> bool {
        let Some(params) = self.params(block_hash) else {
            return false;
        };
        verify(
            &params.seed,
            proof,
            validator.public_key(),
            validator.stake(),
            params.pool_stake,
        )
    }

    /// The retained parameters, oldest first.
    pub fn window(&self) -> impl Iterator<Item = &SortitionParams> {
        self.window.iter()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
