//! Committee management for the Atria consensus core.
//!
//! - [`committee`] — the bounded member set and proposer rotation.
//! - [`error`] — committee error types.

pub mod committee;
pub mod error;

pub use committee::{Committee, MemberInfo};
pub use error::CommitteeError;
