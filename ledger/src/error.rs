use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid block height {0}")]
    InvalidHeight(u64),

    #[error("first block must not carry a previous certificate")]
    UnexpectedPrevCertificate,

    #[error("missing previous certificate for height {0}")]
    MissingPrevCertificate(u64),

    #[error("certificate mismatch: {0}")]
    CertificateMismatch(String),

    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),
}
