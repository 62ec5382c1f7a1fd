//! Abstract storage traits for the Atria protocol.
//!
//! Every storage backend implements these traits; the consensus core and
//! recovery logic depend only on them. The crate also ships [`MemoryStore`],
//! an in-memory backend used throughout the test suites.

pub mod error;
pub mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use atria_ledger::Block;
use atria_transactions::Transaction;
use atria_types::{BlockHash, TxHash, Validator, ValidatorAddress};

/// Read access to persisted chain state.
pub trait StoreReader {
    fn block(&self, height: u64) -> Result<Block, StoreError>;

    fn block_height(&self, hash: &BlockHash) -> Result<u64, StoreError>;

    fn has_any_block(&self) -> bool;

    fn transaction(&self, id: &TxHash) -> Result<Transaction, StoreError>;

    fn validator(&self, address: &ValidatorAddress) -> Result<Validator, StoreError>;

    fn has_validator(&self, address: &ValidatorAddress) -> bool;

    fn validator_by_number(&self, number: u32) -> Result<Validator, StoreError>;

    /// Visit every validator in number order. The consumer returns `true` to
    /// stop iteration early.
    fn iterate_validators(&self, consumer: &mut dyn FnMut(&Validator) -> bool);

    fn total_validators(&self) -> usize;

    /// The opaque last-info blob written by [`Store::save_last_info`].
    fn restore_last_info(&self) -> Result<Vec<u8>, StoreError>;
}

/// Full read/write access. Writes accumulate and become durable (atomically,
/// per block) on [`Store::write_batch`].
pub trait Store: StoreReader + Send + Sync {
    fn update_validator(&self, validator: &Validator) -> Result<(), StoreError>;

    fn save_block(&self, height: u64, block: &Block) -> Result<(), StoreError>;

    fn save_transaction(&self, transaction: &Transaction) -> Result<(), StoreError>;

    fn save_last_info(&self, blob: &[u8]) -> Result<(), StoreError>;

    fn write_batch(&self) -> Result<(), StoreError>;
}
