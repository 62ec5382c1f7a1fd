//! Shared utilities for the Atria protocol.

pub mod logging;
pub mod stats;

pub use stats::StatsCounter;
