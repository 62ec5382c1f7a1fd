//! Cryptographic primitives for the Atria protocol.
//!
//! Ed25519 for validator signatures (via `ed25519-dalek`), Blake2b for
//! hashing. The consensus core never implements primitives itself — it calls
//! through this crate.

pub mod address;
pub mod hash;
pub mod keys;
pub mod sign;
pub mod signer;

pub use address::address_from_public_key;
pub use hash::{blake2b_256, blake2b_256_multi, hash_block, hash_transaction};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
pub use signer::Signer;
