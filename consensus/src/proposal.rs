//! Block proposals.

use atria_crypto::{verify_signature, Signer};
use atria_ledger::Block;
use atria_types::{BlockHash, PublicKey, Signature};
use serde::{Deserialize, Serialize};

/// A signed block proposal for a (height, round).
///
/// The signature covers (height, round, block hash); the block's own hash
/// commits to its full content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    height: u64,
    round: u32,
    block: Block,
    signature: Signature,
}

#[derive(Serialize)]
struct ProposalSignBytes<'a> {
    height: u64,
    round: u32,
    block_hash: &'a BlockHash,
}

impl Proposal {
    pub fn sign_new(height: u64, round: u32, block: Block, signer: &Signer) -> Self {
        let block_hash = block.hash();
        let bytes = sign_bytes(height, round, &block_hash);
        Self {
            height,
            round,
            block,
            signature: signer.sign(&bytes),
        }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn block_hash(&self) -> BlockHash {
        self.block.hash()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Verify the proposer's signature.
    pub fn verify(&self, proposer_key: &PublicKey) -> bool {
        let block_hash = self.block.hash();
        let bytes = sign_bytes(self.height, self.round, &block_hash);
        verify_signature(&bytes, &self.signature, proposer_key)
    }
}

fn sign_bytes(height: u64, round: u32, block_hash: &BlockHash) -> Vec<u8> {
    bincode::serialize(&ProposalSignBytes {
        height,
        round,
        block_hash,
    })
    .expect("proposal sign bytes are always serializable")
}
