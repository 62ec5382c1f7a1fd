//! Consensus steps within a round.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The phase of the current round. Transitions only move forward within a
/// round; a round or height change resets to `Propose` via `NewHeight`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    NewHeight,
    Propose,
    Prepare,
    Precommit,
    Commit,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::NewHeight => "new-height",
            Step::Propose => "propose",
            Step::Prepare => "prepare",
            Step::Precommit => "precommit",
            Step::Commit => "commit",
        };
        write!(f, "{name}")
    }
}
