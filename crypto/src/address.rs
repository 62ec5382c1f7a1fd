//! Validator address derivation.

use atria_types::{PublicKey, ValidatorAddress};

use crate::hash::blake2b_256;

/// Derive a validator address from its public key.
///
/// The address is the first 20 bytes of the Blake2b-256 digest of the raw
/// public key bytes.
pub fn address_from_public_key(public_key: &PublicKey) -> ValidatorAddress {
    let digest = blake2b_256(public_key.as_bytes());
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest[..20]);
    ValidatorAddress::new(addr)
}
