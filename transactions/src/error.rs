use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("invalid version {0}")]
    InvalidVersion(u32),

    #[error("fee should be zero for {0} transactions")]
    NonZeroFee(&'static str),

    #[error("fee is invalid")]
    InvalidFee,

    #[error("no public key")]
    MissingPublicKey,

    #[error("no signature")]
    MissingSignature,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("public key does not belong to signer {0}")]
    SignerMismatch(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
