use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("block {0} not found")]
    BlockNotFound(u64),

    #[error("block hash {0} not found")]
    BlockHashNotFound(String),

    #[error("transaction {0} not found")]
    TransactionNotFound(String),

    #[error("validator {0} not found")]
    ValidatorNotFound(String),

    #[error("validator number {0} not found")]
    ValidatorNumberNotFound(u32),

    #[error("no last info stored")]
    NoLastInfo,

    #[error("storage corrupted: {0}")]
    Corrupted(String),
}
