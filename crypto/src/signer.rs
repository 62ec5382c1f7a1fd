//! Signing identity for a validator node.

use atria_types::{KeyPair, PublicKey, Signature, ValidatorAddress};

use crate::address::address_from_public_key;
use crate::keys::keypair_from_seed;
use crate::sign::sign_message;

/// A validator's signing identity: key pair plus derived address.
///
/// Owned by the consensus engine; every vote, proposal, and sortition proof
/// the node produces goes through this type.
pub struct Signer {
    keypair: KeyPair,
    address: ValidatorAddress,
}

impl Signer {
    pub fn new(keypair: KeyPair) -> Self {
        let address = address_from_public_key(&keypair.public);
        Self { keypair, address }
    }

    /// Deterministic signer from a 32-byte seed (tests and tooling).
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::new(keypair_from_seed(seed))
    }

    pub fn address(&self) -> ValidatorAddress {
        self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.keypair.public
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        sign_message(message, &self.keypair.private)
    }
}
