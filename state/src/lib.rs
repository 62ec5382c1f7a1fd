//! Durable checkpoint and crash recovery for the Atria consensus core.
//!
//! - [`last_info`] — the `{height, certificate}` checkpoint plus the restore
//!   path that rebuilds committee and sortition state from persisted blocks.
//! - [`error`] — fatal recovery errors.

pub mod error;
pub mod last_info;

pub use error::StateError;
pub use last_info::LastInfo;
