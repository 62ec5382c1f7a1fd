//! Network message types for Atria node-to-node consensus traffic.
//!
//! The transport layer is external; this crate only defines the typed
//! envelopes it carries. Consensus payloads (votes, proposals) keep their own
//! signatures — the envelope adds routing metadata, not authentication.

use atria_consensus::{Proposal, Vote};
use atria_ledger::{Block, Certificate};
use atria_types::{BlockHash, NetworkId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire protocol version.
pub const PROTOCOL_VERSION: u16 = 1;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("invalid height")]
    InvalidHeight,

    #[error("message from another network {0}")]
    WrongNetwork(NetworkId),
}

/// All message types in the consensus protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Heartbeat,
    Vote,
    Proposal,
    BlockAnnounce,
}

/// Header present on every network message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub message_type: MessageType,
    pub network_id: NetworkId,
    pub protocol_version: u16,
}

impl MessageHeader {
    pub fn new(message_type: MessageType, network_id: NetworkId) -> Self {
        Self {
            message_type,
            network_id,
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

/// Periodic liveness signal carrying the sender's consensus position.
///
/// Round is unsigned on the wire, so the "round must not be negative" rule is
/// enforced by decoding; height zero is the remaining invalid case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatMessage {
    pub height: u64,
    pub round: u32,
    pub prev_block_hash: BlockHash,
}

impl HeartbeatMessage {
    pub fn new(height: u64, round: u32, prev_block_hash: BlockHash) -> Self {
        Self {
            height,
            round,
            prev_block_hash,
        }
    }

    pub fn sanity_check(&self) -> Result<(), MessageError> {
        if self.height == 0 {
            return Err(MessageError::InvalidHeight);
        }
        Ok(())
    }
}

/// A broadcast consensus vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteMessage {
    pub header: MessageHeader,
    pub vote: Vote,
}

/// A broadcast block proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMessage {
    pub header: MessageHeader,
    pub proposal: Proposal,
}

/// Announcement of a freshly committed block with its certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAnnounceMessage {
    pub header: MessageHeader,
    pub height: u64,
    pub block: Block,
    pub certificate: Certificate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use atria_consensus::VoteType;
    use atria_crypto::Signer;

    #[test]
    fn heartbeat_sanity() {
        let ok = HeartbeatMessage::new(3, 1, BlockHash::new([1u8; 32]));
        ok.sanity_check().expect("valid heartbeat");

        let bad = HeartbeatMessage::new(0, 0, BlockHash::UNDEF);
        assert!(matches!(
            bad.sanity_check(),
            Err(MessageError::InvalidHeight)
        ));
    }

    #[test]
    fn vote_message_round_trips() {
        let signer = Signer::from_seed(&[1u8; 32]);
        let message = VoteMessage {
            header: MessageHeader::new(MessageType::Vote, NetworkId::Dev),
            vote: Vote::sign_new(VoteType::Prepare, 1, 0, BlockHash::new([2u8; 32]), &signer),
        };

        let bytes = bincode::serialize(&message).expect("serialize");
        let back: VoteMessage = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(back, message);
        assert_eq!(back.header.protocol_version, PROTOCOL_VERSION);
    }
}
