//! The execution sandbox — the mutable state view executors run against.

use atria_sortition::SortitionProof;
use atria_types::{BlockHash, Validator, ValidatorAddress};

/// State access for transaction executors.
///
/// Backed by the real chain state in the node and by lightweight mocks in
/// tests; executors never touch the store directly.
pub trait Sandbox {
    fn validator(&self, address: &ValidatorAddress) -> Option<Validator>;

    fn update_validator(&mut self, validator: &Validator);

    /// Height of the block currently being executed.
    fn current_height(&self) -> u64;

    /// Heights a validator must wait after bonding before competing.
    fn bond_interval(&self) -> u64;

    fn is_in_committee(&self, address: &ValidatorAddress) -> bool;

    /// Verify a sortition proof against the seed and pool snapshot of the
    /// block the transaction stamps.
    fn verify_sortition(
        &self,
        stamp: &BlockHash,
        proof: &SortitionProof,
        validator: &Validator,
    ) -> bool;

    /// Admit a validator into the committee at the next boundary.
    fn enter_committee(
        &mut self,
        stamp: &BlockHash,
        address: &ValidatorAddress,
    ) -> Result<(), String>;
}
