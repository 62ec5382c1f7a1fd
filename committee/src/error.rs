use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommitteeError {
    #[error("committee cannot be empty")]
    Empty,

    #[error("{0} validators exceed committee capacity {1}")]
    OverCapacity(usize, usize),

    #[error("validator {0} is already in the committee")]
    MemberExists(String),

    #[error("duplicate joining validator {0}")]
    DuplicateJoiner(String),

    #[error("{joining} joiners exceed the per-update churn limit {allowed}")]
    TooManyJoiners { joining: usize, allowed: usize },

    #[error("proposer {0} is not a committee member")]
    ProposerNotMember(String),
}
