use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("unexpected payload kind for this executor")]
    UnexpectedPayload,

    #[error("unable to retrieve validator {0}")]
    ValidatorNotFound(String),

    #[error("validator {0} has no power to be in the committee")]
    NoPower(String),

    #[error("validator is in the bonding period until height {0}")]
    InBondingPeriod(u64),

    #[error("sortition proof is invalid")]
    InvalidProof,

    #[error("invalid sequence, expected {expected} got {got}")]
    InvalidSequence { expected: u64, got: u64 },

    #[error("validator {0} is in the committee right now")]
    InCommittee(String),

    #[error("validator has already unbonded at height {0}")]
    AlreadyUnbonded(u64),

    #[error("unable to enter the committee: {0}")]
    CommitteeEntry(String),
}
