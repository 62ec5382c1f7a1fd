//! Sortition proof wrapper.

use atria_types::Signature;
use serde::{Deserialize, Serialize};

/// A sortition proof: the validator's Ed25519 signature over the seed.
///
/// A fresh proof is required for each committee-join attempt; replaying a
/// proof against an advanced seed fails signature verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortitionProof(Signature);

impl SortitionProof {
    pub fn new(signature: Signature) -> Self {
        Self(signature)
    }

    pub fn signature(&self) -> &Signature {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        self.0.as_bytes()
    }
}
