//! In-memory storage backend for tests and local tooling.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use atria_ledger::Block;
use atria_transactions::Transaction;
use atria_types::{BlockHash, TxHash, Validator, ValidatorAddress};

use crate::error::StoreError;
use crate::{Store, StoreReader};

#[derive(Default)]
struct Inner {
    blocks: BTreeMap<u64, Block>,
    block_heights: HashMap<BlockHash, u64>,
    transactions: HashMap<TxHash, Transaction>,
    validators: HashMap<ValidatorAddress, Validator>,
    validators_by_number: BTreeMap<u32, ValidatorAddress>,
    last_info: Option<Vec<u8>>,
}

/// A `Store` backed by process memory.
///
/// Always consistent; `write_batch` is a no-op flush point. Interior locking
/// lets the same instance serve the consensus actor and test assertions.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreReader for MemoryStore {
    fn block(&self, height: u64) -> Result<Block, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .blocks
            .get(&height)
            .cloned()
            .ok_or(StoreError::BlockNotFound(height))
    }

    fn block_height(&self, hash: &BlockHash) -> Result<u64, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .block_heights
            .get(hash)
            .copied()
            .ok_or_else(|| StoreError::BlockHashNotFound(hash.to_string()))
    }

    fn has_any_block(&self) -> bool {
        let inner = self.inner.read().expect("store lock poisoned");
        !inner.blocks.is_empty()
    }

    fn transaction(&self, id: &TxHash) -> Result<Transaction, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .transactions
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::TransactionNotFound(id.to_string()))
    }

    fn validator(&self, address: &ValidatorAddress) -> Result<Validator, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .validators
            .get(address)
            .cloned()
            .ok_or_else(|| StoreError::ValidatorNotFound(address.to_string()))
    }

    fn has_validator(&self, address: &ValidatorAddress) -> bool {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.validators.contains_key(address)
    }

    fn validator_by_number(&self, number: u32) -> Result<Validator, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .validators_by_number
            .get(&number)
            .and_then(|addr| inner.validators.get(addr))
            .cloned()
            .ok_or(StoreError::ValidatorNumberNotFound(number))
    }

    fn iterate_validators(&self, consumer: &mut dyn FnMut(&Validator) -> bool) {
        let inner = self.inner.read().expect("store lock poisoned");
        for addr in inner.validators_by_number.values() {
            if let Some(val) = inner.validators.get(addr) {
                if consumer(val) {
                    break;
                }
            }
        }
    }

    fn total_validators(&self) -> usize {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.validators.len()
    }

    fn restore_last_info(&self) -> Result<Vec<u8>, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.last_info.clone().ok_or(StoreError::NoLastInfo)
    }
}

impl Store for MemoryStore {
    fn update_validator(&self, validator: &Validator) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner
            .validators_by_number
            .insert(validator.number(), validator.address());
        inner
            .validators
            .insert(validator.address(), validator.clone());
        Ok(())
    }

    fn save_block(&self, height: u64, block: &Block) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.block_heights.insert(block.hash(), height);
        inner.blocks.insert(height, block.clone());
        Ok(())
    }

    fn save_transaction(&self, transaction: &Transaction) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner
            .transactions
            .insert(transaction.id(), transaction.clone());
        Ok(())
    }

    fn save_last_info(&self, blob: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.last_info = Some(blob.to_vec());
        Ok(())
    }

    fn write_batch(&self) -> Result<(), StoreError> {
        // The memory backend applies writes immediately.
        Ok(())
    }
}
