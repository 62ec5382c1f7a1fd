//! Stake amounts.
//!
//! Stake is denominated in whole units; one unit is the smallest bondable
//! amount. Committee voting power is derived from stake (see
//! [`crate::Validator::power`]).

/// A stake amount in base units.
pub type Stake = u64;
