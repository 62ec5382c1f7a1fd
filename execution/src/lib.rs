//! Transaction executors for the committee lifecycle.
//!
//! Only the two transaction kinds the consensus core depends on live here:
//! sortition (committee entry) and unbond (committee departure). General
//! transaction execution — transfers, bonding, withdrawals — belongs to the
//! external executor.
//!
//! Both executors carry a strict/non-strict mode flag: strict for the
//! proposer's own block assembly and mempool admission, non-strict for
//! validating blocks received from others.

pub mod error;
pub mod sandbox;
pub mod sortition;
pub mod unbond;

pub use error::ExecutionError;
pub use sandbox::Sandbox;
pub use sortition::SortitionExecutor;
pub use unbond::UnbondExecutor;

#[cfg(test)]
mod tests {
    use super::*;
    use atria_crypto::Signer;
    use atria_sortition::SortitionProof;
    use atria_transactions::Transaction;
    use atria_types::{BlockHash, Validator, ValidatorAddress};
    use std::collections::{HashMap, HashSet};

    struct MockSandbox {
        validators: HashMap<ValidatorAddress, Validator>,
        committee: HashSet<ValidatorAddress>,
        entered: Vec<ValidatorAddress>,
        height: u64,
        bond_interval: u64,
        proof_valid: bool,
        entry_full: bool,
    }

    impl MockSandbox {
        fn new(height: u64) -> Self {
            Self {
                validators: HashMap::new(),
                committee: HashSet::new(),
                entered: Vec::new(),
                height,
                bond_interval: 0,
                proof_valid: true,
                entry_full: false,
            }
        }

        fn add_validator(&mut self, val: &Validator) {
            self.validators.insert(val.address(), val.clone());
        }
    }

    impl Sandbox for MockSandbox {
        fn validator(&self, address: &ValidatorAddress) -> Option<Validator> {
            self.validators.get(address).cloned()
        }

        fn update_validator(&mut self, validator: &Validator) {
            self.validators.insert(validator.address(), validator.clone());
        }

        fn current_height(&self) -> u64 {
            self.height
        }

        fn bond_interval(&self) -> u64 {
            self.bond_interval
        }

        fn is_in_committee(&self, address: &ValidatorAddress) -> bool {
            self.committee.contains(address)
        }

        fn verify_sortition(
            &self,
            _stamp: &BlockHash,
            _proof: &SortitionProof,
            _validator: &Validator,
        ) -> bool {
            self.proof_valid
        }

        fn enter_committee(
            &mut self,
            _stamp: &BlockHash,
            address: &ValidatorAddress,
        ) -> Result<(), String> {
            if self.entry_full {
                return Err("committee is full".into());
            }
            self.entered.push(*address);
            Ok(())
        }
    }

    fn make_validator(seed: u8, number: u32, stake: u64) -> (Signer, Validator) {
        let signer = Signer::from_seed(&[seed; 32]);
        let mut val = Validator::new(signer.public_key().clone(), signer.address(), number);
        val.add_to_stake(stake);
        (signer, val)
    }

    fn sortition_tx(signer: &Signer, sequence: u64) -> Transaction {
        let proof = SortitionProof::new(signer.sign(b"seed"));
        let mut tx = Transaction::new_sortition(
            BlockHash::new([1u8; 32]),
            sequence,
            signer.address(),
            proof,
        );
        tx.sign(signer);
        tx
    }

    // ── SortitionExecutor ───────────────────────────────────────────────

    #[test]
    fn strict_sortition_enters_committee() {
        let (signer, val) = make_validator(1, 0, 1000);
        let mut sb = MockSandbox::new(10);
        sb.add_validator(&val);

        SortitionExecutor::new(true)
            .execute(&sortition_tx(&signer, 1), &mut sb)
            .expect("executes");

        assert_eq!(sb.entered, vec![val.address()]);
        let updated = sb.validator(&val.address()).unwrap();
        assert_eq!(updated.sequence(), 1);
        assert_eq!(updated.last_joined_height(), 10);
    }

    #[test]
    fn strict_sortition_rejects_wrong_sequence() {
        let (signer, val) = make_validator(1, 0, 1000);
        let mut sb = MockSandbox::new(10);
        sb.add_validator(&val);

        let err = SortitionExecutor::new(true)
            .execute(&sortition_tx(&signer, 5), &mut sb)
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::InvalidSequence { expected: 1, got: 5 }
        ));
        assert!(sb.entered.is_empty());
    }

    #[test]
    fn non_strict_sortition_skips_sequence_and_entry() {
        let (signer, val) = make_validator(1, 0, 1000);
        let mut sb = MockSandbox::new(10);
        sb.add_validator(&val);

        // Sequence 5 would be invalid in strict mode.
        SortitionExecutor::new(false)
            .execute(&sortition_tx(&signer, 5), &mut sb)
            .expect("non-strict accepts pending duplicates");

        assert!(sb.entered.is_empty());
        assert_eq!(sb.validator(&val.address()).unwrap().sequence(), 1);
    }

    #[test]
    fn sortition_rejects_unknown_validator() {
        let (signer, _) = make_validator(1, 0, 1000);
        let mut sb = MockSandbox::new(10);

        let err = SortitionExecutor::new(true)
            .execute(&sortition_tx(&signer, 1), &mut sb)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::ValidatorNotFound(_)));
    }

    #[test]
    fn sortition_rejects_powerless_validator() {
        let (signer, mut val) = make_validator(1, 0, 1000);
        val.update_unbonding_height(5);
        let mut sb = MockSandbox::new(10);
        sb.add_validator(&val);

        let err = SortitionExecutor::new(true)
            .execute(&sortition_tx(&signer, 1), &mut sb)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::NoPower(_)));
    }

    #[test]
    fn sortition_rejects_within_bonding_period() {
        let (signer, mut val) = make_validator(1, 0, 1000);
        val.update_last_bonding_height(8);
        let mut sb = MockSandbox::new(10);
        sb.bond_interval = 5;
        sb.add_validator(&val);

        let err = SortitionExecutor::new(true)
            .execute(&sortition_tx(&signer, 1), &mut sb)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::InBondingPeriod(13)));
    }

    #[test]
    fn sortition_rejects_invalid_proof() {
        let (signer, val) = make_validator(1, 0, 1000);
        let mut sb = MockSandbox::new(10);
        sb.proof_valid = false;
        sb.add_validator(&val);

        let err = SortitionExecutor::new(true)
            .execute(&sortition_tx(&signer, 1), &mut sb)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidProof));
    }

    #[test]
    fn sortition_surfaces_full_committee() {
        let (signer, val) = make_validator(1, 0, 1000);
        let mut sb = MockSandbox::new(10);
        sb.entry_full = true;
        sb.add_validator(&val);

        let err = SortitionExecutor::new(true)
            .execute(&sortition_tx(&signer, 1), &mut sb)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::CommitteeEntry(_)));
    }

    #[test]
    fn sortition_rejects_foreign_payload() {
        let (signer, val) = make_validator(1, 0, 1000);
        let mut sb = MockSandbox::new(10);
        sb.add_validator(&val);

        let mut tx = Transaction::new_unbond(BlockHash::new([1u8; 32]), 1, signer.address());
        tx.sign(&signer);
        let err = SortitionExecutor::new(true).execute(&tx, &mut sb).unwrap_err();
        assert!(matches!(err, ExecutionError::UnexpectedPayload));
    }

    // ── UnbondExecutor ──────────────────────────────────────────────────

    fn unbond_tx(signer: &Signer, sequence: u64) -> Transaction {
        let mut tx =
            Transaction::new_unbond(BlockHash::new([1u8; 32]), sequence, signer.address());
        tx.sign(signer);
        tx
    }

    #[test]
    fn unbond_records_height() {
        let (signer, val) = make_validator(1, 0, 1000);
        let mut sb = MockSandbox::new(20);
        sb.add_validator(&val);

        UnbondExecutor::new(true)
            .execute(&unbond_tx(&signer, 1), &mut sb)
            .expect("executes");

        let updated = sb.validator(&val.address()).unwrap();
        assert_eq!(updated.unbonding_height(), 20);
        assert_eq!(updated.sequence(), 1);
        assert_eq!(updated.power(), 0);
    }

    #[test]
    fn strict_unbond_rejects_committee_member() {
        let (signer, val) = make_validator(1, 0, 1000);
        let mut sb = MockSandbox::new(20);
        sb.add_validator(&val);
        sb.committee.insert(val.address());

        let err = UnbondExecutor::new(true)
            .execute(&unbond_tx(&signer, 1), &mut sb)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::InCommittee(_)));
    }

    #[test]
    fn non_strict_unbond_allows_committee_member() {
        let (signer, val) = make_validator(1, 0, 1000);
        let mut sb = MockSandbox::new(20);
        sb.add_validator(&val);
        sb.committee.insert(val.address());

        UnbondExecutor::new(false)
            .execute(&unbond_tx(&signer, 1), &mut sb)
            .expect("non-strict accepts");
    }

    #[test]
    fn double_unbond_rejected() {
        let (signer, mut val) = make_validator(1, 0, 1000);
        val.update_unbonding_height(15);
        let mut sb = MockSandbox::new(20);
        sb.add_validator(&val);

        let err = UnbondExecutor::new(false)
            .execute(&unbond_tx(&signer, 1), &mut sb)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::AlreadyUnbonded(15)));
    }

    #[test]
    fn unbond_rejects_wrong_sequence() {
        let (signer, val) = make_validator(1, 0, 1000);
        let mut sb = MockSandbox::new(20);
        sb.add_validator(&val);

        let err = UnbondExecutor::new(true)
            .execute(&unbond_tx(&signer, 3), &mut sb)
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::InvalidSequence { expected: 1, got: 3 }
        ));
    }
}
