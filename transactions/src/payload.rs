//! Transaction payloads — a tagged sum over the fixed payload kinds.
//!
//! The wire format writes the variant discriminant before the payload fields,
//! so decoders read the tag and dispatch to the matching struct.

use atria_sortition::SortitionProof;
use atria_types::{PublicKey, Stake, ValidatorAddress};
use serde::{Deserialize, Serialize};

use crate::error::TransactionError;

/// Plain value transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPayload {
    pub sender: ValidatorAddress,
    pub receiver: ValidatorAddress,
    pub amount: Stake,
}

/// Bond stake to a validator. Creates the validator record on first bond.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondPayload {
    pub sender: ValidatorAddress,
    pub validator: ValidatorAddress,
    pub public_key: PublicKey,
    pub stake: Stake,
}

/// Begin unbonding a validator's stake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondPayload {
    pub validator: ValidatorAddress,
}

/// Withdraw stake after the unbonding interval has elapsed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPayload {
    pub validator: ValidatorAddress,
    pub receiver: ValidatorAddress,
    pub amount: Stake,
}

/// Claim a committee seat with a sortition proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortitionPayload {
    pub address: ValidatorAddress,
    pub proof: SortitionProof,
}

/// The payload kinds, used for dispatch and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    Send,
    Bond,
    Unbond,
    Withdraw,
    Sortition,
}

/// A transaction payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    Send(SendPayload),
    Bond(BondPayload),
    Unbond(UnbondPayload),
    Withdraw(WithdrawPayload),
    Sortition(SortitionPayload),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Send(_) => PayloadKind::Send,
            Payload::Bond(_) => PayloadKind::Bond,
            Payload::Unbond(_) => PayloadKind::Unbond,
            Payload::Withdraw(_) => PayloadKind::Withdraw,
            Payload::Sortition(_) => PayloadKind::Sortition,
        }
    }

    /// The address whose key must have signed the enclosing transaction.
    pub fn signer(&self) -> ValidatorAddress {
        match self {
            Payload::Send(p) => p.sender,
            Payload::Bond(p) => p.sender,
            Payload::Unbond(p) => p.validator,
            Payload::Withdraw(p) => p.validator,
            Payload::Sortition(p) => p.address,
        }
    }

    pub fn sanity_check(&self) -> Result<(), TransactionError> {
        match self {
            Payload::Send(p) => {
                if p.amount == 0 {
                    return Err(TransactionError::InvalidPayload(
                        "send amount must be positive".into(),
                    ));
                }
            }
            Payload::Bond(p) => {
                if p.stake == 0 {
                    return Err(TransactionError::InvalidPayload(
                        "bonded stake must be positive".into(),
                    ));
                }
            }
            Payload::Withdraw(p) => {
                if p.amount == 0 {
                    return Err(TransactionError::InvalidPayload(
                        "withdraw amount must be positive".into(),
                    ));
                }
            }
            Payload::Unbond(_) | Payload::Sortition(_) => {}
        }
        Ok(())
    }
}
