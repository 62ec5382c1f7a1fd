//! Verifiable sortition for committee admission.
//!
//! Each height, every validator outside the committee may evaluate a
//! sortition proof against the current seed. The proof is an Ed25519
//! signature over the seed — deterministic, unforgeable, and verifiable by
//! anyone holding the validator's public key. A hash of the proof is compared
//! against a threshold proportional to `stake / pool_stake`, so higher-stake
//! validators win slots proportionally more often while selection stays
//! probabilistic.
//!
//! ## Module overview
//!
//! - [`seed`] — the per-block verifiable seed chain.
//! - [`proof`] — the sortition proof wrapper.
//! - [`engine`] — evaluate/verify plus the recent-parameters window.

pub mod engine;
pub mod proof;
pub mod seed;

pub use engine::{evaluate, verify, Sortition, SortitionParams, SORTITION_WINDOW};
pub use proof::SortitionProof;
pub use seed::VerifiableSeed;
