//! Verifiable sortition seed — a hash chain over block certificates.
//!
//! The seed for a block is derived from the previous block's seed and the
//! certificate embedded in the block. Any node holding the previous seed and
//! the certificate recomputes the same value, so a proposer cannot grind the
//! seed without also forging a quorum certificate.

use atria_crypto::blake2b_256_multi;
use atria_types::BlockHash;
use serde::{Deserialize, Serialize};
use std::fmt;

const SEED_DOMAIN: &[u8] = b"atria.sortition.seed";

/// A 32-byte sortition seed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerifiableSeed([u8; 32]);

impl VerifiableSeed {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The seed of the first block, derived from the genesis document hash.
    pub fn genesis(genesis_hash: &BlockHash) -> Self {
        Self(blake2b_256_multi(&[SEED_DOMAIN, genesis_hash.as_bytes()]))
    }

    /// Derive the next seed in the chain from the hash of the certificate
    /// embedded in the next block.
    pub fn next(&self, certificate_hash: &BlockHash) -> Self {
        Self(blake2b_256_multi(&[
            SEED_DOMAIN,
            &self.0,
            certificate_hash.as_bytes(),
        ]))
    }
}

impl fmt::Debug for VerifiableSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.0[..4].iter().map(|b| format!("{:02x}", b)).collect();
        write!(f, "VerifiableSeed({})", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_is_deterministic() {
        let genesis = VerifiableSeed::genesis(&BlockHash::new([1u8; 32]));
        let cert_hash = BlockHash::new([2u8; 32]);
        assert_eq!(genesis.next(&cert_hash), genesis.next(&cert_hash));
    }

    #[test]
    fn different_certificates_diverge() {
        let genesis = VerifiableSeed::genesis(&BlockHash::new([1u8; 32]));
        let a = genesis.next(&BlockHash::new([2u8; 32]));
        let b = genesis.next(&BlockHash::new([3u8; 32]));
        assert_ne!(a, b);
    }

    #[test]
    fn seed_advances_each_height() {
        let mut seed = VerifiableSeed::genesis(&BlockHash::new([1u8; 32]));
        let cert_hash = BlockHash::new([9u8; 32]);
        let mut seen = vec![seed];
        for _ in 0..5 {
            seed = seed.next(&cert_hash);
            assert!(!seen.contains(&seed));
            seen.push(seed);
        }
    }
}
