use atria_committee::CommitteeError;
use atria_store::StoreError;
use thiserror::Error;

/// Recovery errors. Every variant is fatal to startup: a node that cannot
/// rebuild its committee and sortition state from history must not run.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("unable to decode last info: {0}")]
    Decode(String),

    #[error("no certificate recorded yet")]
    NoCertificate,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unable to rebuild committee: {0}")]
    Committee(#[from] CommitteeError),
}
