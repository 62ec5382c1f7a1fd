//! Validator record — identity, stake, and bonding state.
//!
//! The store owns validator records; the committee and sortition engine hold
//! read-only copies derived from them, never a second source of truth.

use crate::{PublicKey, Stake, ValidatorAddress};
use serde::{Deserialize, Serialize};

/// A registered validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    public_key: PublicKey,
    address: ValidatorAddress,
    /// Sequential number assigned when the validator first bonded.
    number: u32,
    /// Anti-replay counter for the validator's own transactions.
    sequence: u64,
    stake: Stake,
    last_bonding_height: u64,
    /// Height at which the validator unbonded; zero while active.
    unbonding_height: u64,
    /// Height of the validator's most recent committee entry.
    last_joined_height: u64,
}

impl Validator {
    pub fn new(public_key: PublicKey, address: ValidatorAddress, number: u32) -> Self {
        Self {
            public_key,
            address,
            number,
            sequence: 0,
            stake: 0,
            last_bonding_height: 0,
            unbonding_height: 0,
            last_joined_height: 0,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn address(&self) -> ValidatorAddress {
        self.address
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn stake(&self) -> Stake {
        self.stake
    }

    pub fn last_bonding_height(&self) -> u64 {
        self.last_bonding_height
    }

    pub fn unbonding_height(&self) -> u64 {
        self.unbonding_height
    }

    pub fn last_joined_height(&self) -> u64 {
        self.last_joined_height
    }

    pub fn has_unbonded(&self) -> bool {
        self.unbonding_height > 0
    }

    /// Committee voting power.
    ///
    /// Stake-weighted, with a floor of one unit for active zero-stake
    /// (bootstrap) validators. Unbonding validators have no power.
    pub fn power(&self) -> u64 {
        if self.unbonding_height > 0 {
            0
        } else if self.stake == 0 {
            1
        } else {
            self.stake
        }
    }

    pub fn inc_sequence(&mut self) {
        self.sequence += 1;
    }

    pub fn add_to_stake(&mut self, amount: Stake) {
        self.stake = self.stake.saturating_add(amount);
    }

    pub fn update_last_bonding_height(&mut self, height: u64) {
        self.last_bonding_height = height;
    }

    pub fn update_unbonding_height(&mut self, height: u64) {
        self.unbonding_height = height;
    }

    pub fn update_last_joined_height(&mut self, height: u64) {
        self.last_joined_height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn val(number: u32) -> Validator {
        Validator::new(
            PublicKey([number as u8; 32]),
            ValidatorAddress::new([number as u8; 20]),
            number,
        )
    }

    #[test]
    fn new_validator_is_active_with_bootstrap_power() {
        let v = val(1);
        assert_eq!(v.stake(), 0);
        assert!(!v.has_unbonded());
        assert_eq!(v.power(), 1);
    }

    #[test]
    fn power_tracks_stake() {
        let mut v = val(1);
        v.add_to_stake(5000);
        assert_eq!(v.power(), 5000);
    }

    #[test]
    fn unbonded_validator_has_no_power() {
        let mut v = val(1);
        v.add_to_stake(5000);
        v.update_unbonding_height(42);
        assert!(v.has_unbonded());
        assert_eq!(v.power(), 0);
    }

    #[test]
    fn sequence_increments() {
        let mut v = val(1);
        v.inc_sequence();
        v.inc_sequence();
        assert_eq!(v.sequence(), 2);
    }

    proptest::proptest! {
        #[test]
        fn power_invariants(stake in 0u64..u64::MAX / 2, unbonding in 0u64..1000) {
            let mut v = val(1);
            v.add_to_stake(stake);
            v.update_unbonding_height(unbonding);

            if unbonding > 0 {
                proptest::prop_assert_eq!(v.power(), 0);
            } else if stake == 0 {
                proptest::prop_assert_eq!(v.power(), 1);
            } else {
                proptest::prop_assert_eq!(v.power(), stake);
            }
        }
    }
}
