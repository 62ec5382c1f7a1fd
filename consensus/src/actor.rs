//! The consensus actor — single sequential owner of the state machine.
//!
//! Timers, inbound votes, and proposals are independent producers; all of
//! them funnel through one mpsc channel into the task that owns the
//! [`Consensus`] value. External readers never touch live state: snapshot
//! queries are answered by the actor itself, so reads see committee, pool,
//! and step as one consistent picture.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::consensus::{Consensus, ConsensusSnapshot};
use crate::error::ConsensusError;
use crate::event::{OutboundEvent, TimeoutTicket};
use crate::proposal::Proposal;
use crate::vote::Vote;

enum Command {
    Vote(Vote),
    Proposal(Proposal),
    Timeout(TimeoutTicket),
    Snapshot(oneshot::Sender<ConsensusSnapshot>),
    Stop,
}

/// Cheap cloneable handle for feeding the actor.
#[derive(Clone)]
pub struct ConsensusHandle {
    commands: mpsc::Sender<Command>,
}

impl ConsensusHandle {
    pub async fn submit_vote(&self, vote: Vote) -> Result<(), ConsensusError> {
        self.commands
            .send(Command::Vote(vote))
            .await
            .map_err(|_| ConsensusError::ActorStopped)
    }

    pub async fn submit_proposal(&self, proposal: Proposal) -> Result<(), ConsensusError> {
        self.commands
            .send(Command::Proposal(proposal))
            .await
            .map_err(|_| ConsensusError::ActorStopped)
    }

    /// A consistent snapshot of height/round/step and committee.
    pub async fn snapshot(&self) -> Result<ConsensusSnapshot, ConsensusError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Snapshot(reply))
            .await
            .map_err(|_| ConsensusError::ActorStopped)?;
        response.await.map_err(|_| ConsensusError::ActorStopped)
    }

    pub async fn stop(&self) {
        let _ = self.commands.send(Command::Stop).await;
    }
}

/// Spawn the actor. The machine is armed at the next height immediately;
/// outbound votes, proposals, and commit notifications are delivered on
/// `outbound` for the network layer to broadcast.
pub fn spawn(
    mut consensus: Consensus,
    outbound: mpsc::Sender<OutboundEvent>,
) -> ConsensusHandle {
    let (commands, mut inbox) = mpsc::channel(256);
    let handle = ConsensusHandle {
        commands: commands.clone(),
    };

    tokio::spawn(async move {
        consensus.move_to_new_height();
        drain(&mut consensus, &outbound, &commands).await;

        while let Some(command) = inbox.recv().await {
            let result = match command {
                Command::Vote(vote) => consensus.add_vote(vote),
                Command::Proposal(proposal) => consensus.set_proposal(proposal),
                Command::Timeout(ticket) => consensus.on_timeout(ticket),
                Command::Snapshot(reply) => {
                    let _ = reply.send(consensus.snapshot());
                    Ok(())
                }
                Command::Stop => break,
            };
            match result {
                Ok(()) => drain(&mut consensus, &outbound, &commands).await,
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "consensus halted");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "consensus input rejected");
                    drain(&mut consensus, &outbound, &commands).await;
                }
            }
        }
        debug!("consensus actor stopped");
    });

    handle
}

async fn drain(
    consensus: &mut Consensus,
    outbound: &mpsc::Sender<OutboundEvent>,
    commands: &mpsc::Sender<Command>,
) {
    for event in consensus.take_outbox() {
        if outbound.send(event).await.is_err() {
            debug!("outbound channel closed");
        }
    }
    for ticket in consensus.take_timeouts() {
        let commands = commands.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ticket.duration).await;
            // The machine drops the ticket if it has moved on meanwhile.
            let _ = commands.send(Command::Timeout(ticket)).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use atria_committee::Committee;
    use atria_crypto::Signer;
    use atria_ledger::Block;
    use atria_sortition::Sortition;
    use atria_state::LastInfo;
    use atria_store::{MemoryStore, Store};
    use atria_transactions::Transaction;
    use atria_types::{BlockHash, ProtocolParams, Timestamp, Validator};

    use crate::config::ConsensusConfig;
    use crate::traits::{ExecutionOutcome, Executor, ExecutorError, TxSource};
    use crate::vote::{Vote, VoteType};

    struct NullExecutor;

    impl Executor for NullExecutor {
        fn execute(&self, _block: &Block) -> Result<ExecutionOutcome, ExecutorError> {
            Ok(ExecutionOutcome {
                joined_committee: vec![],
                total_stake: 0,
            })
        }
    }

    struct NullTxSource;

    impl TxSource for NullTxSource {
        fn poll_transactions(&self, _height: u64) -> Vec<Transaction> {
            Vec::new()
        }
    }

    fn build_consensus(signers: &[Signer], self_index: usize) -> Consensus {
        let store = Arc::new(MemoryStore::new());
        let mut validators = Vec::new();
        for (i, s) in signers.iter().enumerate() {
            let v = Validator::new(s.public_key().clone(), s.address(), i as u32);
            store.update_validator(&v).unwrap();
            validators.push(v);
        }
        let proposer = validators[0].address();
        let committee = Committee::new(validators, 4, proposer).unwrap();
        let last_info =
            LastInfo::from_genesis(BlockHash::new([0xfe; 32]), Timestamp::new(100));

        // Generous timeouts so timers never race the test.
        let config = ConsensusConfig {
            propose_timeout_ms: 60_000,
            prepare_timeout_ms: 60_000,
            precommit_timeout_ms: 60_000,
            timeout_delta_ms: 0,
        };
        let mut params = ProtocolParams::dev();
        params.committee_size = 4;

        Consensus::new(
            config,
            Signer::from_seed(&[self_index as u8 + 1; 32]),
            params,
            committee,
            Sortition::new(),
            last_info,
            store,
            Box::new(NullExecutor),
            Box::new(NullTxSource),
            Arc::new(Consensus::default_metrics()),
        )
    }

    async fn recv(rx: &mut mpsc::Receiver<OutboundEvent>) -> OutboundEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event in time")
            .expect("channel open")
    }

    #[tokio::test]
    async fn actor_commits_a_block_end_to_end() {
        let signers: Vec<Signer> = (1u8..=4).map(|b| Signer::from_seed(&[b; 32])).collect();
        let consensus = build_consensus(&signers, 0); // this node proposes

        let (out_tx, mut out_rx) = mpsc::channel(64);
        let handle = spawn(consensus, out_tx);

        let hash = match recv(&mut out_rx).await {
            OutboundEvent::Proposal(p) => p.block_hash(),
            other => panic!("expected a proposal first, got {other:?}"),
        };
        match recv(&mut out_rx).await {
            OutboundEvent::Vote(v) => assert_eq!(v.vote_type(), VoteType::Prepare),
            other => panic!("expected our prepare vote, got {other:?}"),
        }

        for i in [1usize, 2] {
            let vote = Vote::sign_new(VoteType::Prepare, 1, 0, hash, &signers[i]);
            handle.submit_vote(vote).await.unwrap();
        }
        match recv(&mut out_rx).await {
            OutboundEvent::Vote(v) => assert_eq!(v.vote_type(), VoteType::Precommit),
            other => panic!("expected our precommit vote, got {other:?}"),
        }

        for i in [1usize, 2] {
            let vote = Vote::sign_new(VoteType::Precommit, 1, 0, hash, &signers[i]);
            handle.submit_vote(vote).await.unwrap();
        }
        match recv(&mut out_rx).await {
            OutboundEvent::BlockCommitted {
                height,
                certificate,
                ..
            } => {
                assert_eq!(height, 1);
                assert_eq!(certificate.signatures().len(), 3);
            }
            other => panic!("expected the commit notification, got {other:?}"),
        }

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.height, 2);
        assert_eq!(snapshot.round, 0);

        handle.stop().await;
    }

    #[tokio::test]
    async fn snapshot_reads_do_not_disturb_the_machine() {
        let signers: Vec<Signer> = (1u8..=4).map(|b| Signer::from_seed(&[b; 32])).collect();
        let consensus = build_consensus(&signers, 3); // not the proposer

        let (out_tx, mut out_rx) = mpsc::channel(64);
        let handle = spawn(consensus, out_tx);

        let a = handle.snapshot().await.unwrap();
        let b = handle.snapshot().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.height, 1);
        assert_eq!(a.step, crate::step::Step::Propose);
        assert_eq!(a.committers, vec![0, 1, 2, 3]);

        // No outbound traffic was produced by reading.
        assert!(out_rx.try_recv().is_err());
        handle.stop().await;
    }
}
