//! Sortition transaction executor — the committee-entry path.

use atria_transactions::{Payload, Transaction};

use crate::error::ExecutionError;
use crate::sandbox::Sandbox;

/// Executes sortition transactions.
///
/// In strict mode the sequence number must be exactly the validator's next
/// one and the validator enters the committee immediately. A validator might
/// produce more than one sortition transaction before entering the committee;
/// in non-strict mode the sequence number is not checked.
pub struct SortitionExecutor {
    strict: bool,
}

impl SortitionExecutor {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub fn execute(
        &self,
        trx: &Transaction,
        sandbox: &mut dyn Sandbox,
    ) -> Result<(), ExecutionError> {
        let Payload::Sortition(pld) = trx.payload() else {
            return Err(ExecutionError::UnexpectedPayload);
        };

        let mut val = sandbox
            .validator(&pld.address)
            .ok_or_else(|| ExecutionError::ValidatorNotFound(pld.address.to_string()))?;

        // Power for unbonding validators is zero.
        if val.power() == 0 {
            return Err(ExecutionError::NoPower(val.address().to_string()));
        }
        if sandbox.current_height() - val.last_bonding_height() < sandbox.bond_interval() {
            return Err(ExecutionError::InBondingPeriod(
                val.last_bonding_height() + sandbox.bond_interval(),
            ));
        }
        if !sandbox.verify_sortition(trx.stamp(), &pld.proof, &val) {
            return Err(ExecutionError::InvalidProof);
        }
        if self.strict {
            if val.sequence() + 1 != trx.sequence() {
                return Err(ExecutionError::InvalidSequence {
                    expected: val.sequence() + 1,
                    got: trx.sequence(),
                });
            }
            sandbox
                .enter_committee(trx.stamp(), &val.address())
                .map_err(ExecutionError::CommitteeEntry)?;
        }

        val.inc_sequence();
        val.update_last_joined_height(sandbox.current_height());
        sandbox.update_validator(&val);

        Ok(())
    }

    /// Sortition transactions are fee-free.
    pub fn fee(&self) -> u64 {
        0
    }
}
