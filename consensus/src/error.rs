use atria_committee::CommitteeError;
use atria_state::StateError;
use atria_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("invalid vote: {0}")]
    InvalidVote(String),

    #[error("vote from non-committee signer {0}")]
    NonCommitteeVoter(String),

    #[error("equivocation by {signer} at {height}/{round}")]
    Equivocation {
        signer: String,
        height: u64,
        round: u32,
    },

    #[error("invalid proposal: {0}")]
    InvalidProposal(String),

    #[error("no quorum at {height}/{round}")]
    NoQuorum { height: u64, round: u32 },

    #[error("certificate invariant violated: {0}")]
    CertificateInvariant(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("executor failed: {0}")]
    Executor(String),

    #[error("consensus actor stopped")]
    ActorStopped,

    #[error(transparent)]
    Committee(#[from] CommitteeError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ConsensusError {
    /// Whether the node must halt rather than continue on this error.
    ///
    /// A certificate invariant violation means the pool's quorum check and
    /// the certificate builder disagree; persistence or committee failures
    /// during commit leave the chain view inconsistent.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConsensusError::CertificateInvariant(_)
                | ConsensusError::Executor(_)
                | ConsensusError::Committee(_)
                | ConsensusError::State(_)
                | ConsensusError::Store(_)
        )
    }
}
