//! Unbond transaction executor — the committee-departure path.

use atria_transactions::{Payload, Transaction};

use crate::error::ExecutionError;
use crate::sandbox::Sandbox;

/// Executes unbond transactions.
///
/// Strict mode rejects unbonding while the validator sits in the committee;
/// relaxed block validation accepts it (the member is dropped at the next
/// boundary anyway).
pub struct UnbondExecutor {
    strict: bool,
}

impl UnbondExecutor {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub fn execute(
        &self,
        trx: &Transaction,
        sandbox: &mut dyn Sandbox,
    ) -> Result<(), ExecutionError> {
        let Payload::Unbond(pld) = trx.payload() else {
            return Err(ExecutionError::UnexpectedPayload);
        };

        let mut val = sandbox
            .validator(&pld.validator)
            .ok_or_else(|| ExecutionError::ValidatorNotFound(pld.validator.to_string()))?;

        if val.sequence() + 1 != trx.sequence() {
            return Err(ExecutionError::InvalidSequence {
                expected: val.sequence() + 1,
                got: trx.sequence(),
            });
        }
        if self.strict && sandbox.is_in_committee(&pld.validator) {
            return Err(ExecutionError::InCommittee(pld.validator.to_string()));
        }
        if val.unbonding_height() > 0 {
            return Err(ExecutionError::AlreadyUnbonded(val.unbonding_height()));
        }

        val.inc_sequence();
        val.update_unbonding_height(sandbox.current_height());
        sandbox.update_validator(&val);

        Ok(())
    }

    /// Unbond transactions are fee-free.
    pub fn fee(&self) -> u64 {
        0
    }
}
