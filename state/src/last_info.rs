//! The durable consensus checkpoint and crash recovery.
//!
//! Only `{last_block_height, last_certificate}` is persisted, as an opaque
//! blob. Everything else the consensus core needs at startup — the committee
//! and the sortition parameter window — is rebuilt by replaying the last few
//! persisted blocks, so durability comes from block storage rather than from
//! snapshotting in-memory state.

use std::collections::HashMap;

use atria_committee::Committee;
use atria_ledger::{Block, Certificate};
use atria_sortition::{Sortition, SortitionParams, VerifiableSeed, SORTITION_WINDOW};
use atria_store::{Store, StoreReader};
use atria_transactions::Payload;
use atria_types::{BlockHash, Timestamp, ValidatorAddress};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StateError;

#[derive(Serialize)]
struct LastInfoDataRef<'a> {
    last_block_height: u64,
    last_certificate: &'a Certificate,
}

#[derive(Deserialize)]
struct LastInfoData {
    last_block_height: u64,
    last_certificate: Certificate,
}

/// The node's view of the last finalized block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LastInfo {
    last_block_height: u64,
    last_block_hash: BlockHash,
    last_block_time: Timestamp,
    last_sortition_seed: VerifiableSeed,
    last_certificate: Option<Certificate>,
}

impl LastInfo {
    /// State of a fresh chain: nothing finalized yet, the seed chain starts
    /// from the genesis document hash.
    pub fn from_genesis(genesis_hash: BlockHash, genesis_time: Timestamp) -> Self {
        Self {
            last_block_height: 0,
            last_block_hash: genesis_hash,
            last_block_time: genesis_time,
            last_sortition_seed: VerifiableSeed::genesis(&genesis_hash),
            last_certificate: None,
        }
    }

    pub fn block_height(&self) -> u64 {
        self.last_block_height
    }

    pub fn block_hash(&self) -> &BlockHash {
        &self.last_block_hash
    }

    pub fn block_time(&self) -> Timestamp {
        self.last_block_time
    }

    pub fn sortition_seed(&self) -> &VerifiableSeed {
        &self.last_sortition_seed
    }

    pub fn certificate(&self) -> Option<&Certificate> {
        self.last_certificate.as_ref()
    }

    /// Record a newly finalized block.
    pub fn update(&mut self, height: u64, block: &Block, certificate: Certificate) {
        self.last_block_height = height;
        self.last_block_hash = block.hash();
        self.last_block_time = block.header().time;
        self.last_sortition_seed = block.header().sortition_seed;
        self.last_certificate = Some(certificate);
    }

    /// Persist the checkpoint blob.
    pub fn save(&self, store: &dyn Store) -> Result<(), StateError> {
        let certificate = self
            .last_certificate
            .as_ref()
            .ok_or(StateError::NoCertificate)?;
        let blob = bincode::serialize(&LastInfoDataRef {
            last_block_height: self.last_block_height,
            last_certificate: certificate,
        })
        .expect("last info is always serializable");
        store.save_last_info(&blob)?;
        Ok(())
    }

    /// Rebuild the checkpoint, the committee, and the sortition window from
    /// persisted history. Run once at startup, before the state machine is
    /// armed. Any lookup failure is fatal — recovery cannot proceed with a
    /// torn history.
    pub fn restore(
        store: &dyn Store,
        committee_size: usize,
        sortition: &mut Sortition,
    ) -> Result<(Self, Committee), StateError> {
        let blob = store.restore_last_info()?;
        let data: LastInfoData =
            bincode::deserialize(&blob).map_err(|e| StateError::Decode(e.to_string()))?;

        debug!(height = data.last_block_height, "restoring last state info");

        let block = store.block(data.last_block_height)?;
        let last_info = Self {
            last_block_height: data.last_block_height,
            last_block_hash: block.hash(),
            last_block_time: block.header().time,
            last_sortition_seed: block.header().sortition_seed,
            last_certificate: Some(data.last_certificate.clone()),
        };

        let committee =
            restore_committee(store, &block, &data.last_certificate, committee_size)?;
        last_info.restore_sortition(store, sortition, &committee)?;

        Ok((last_info, committee))
    }

    /// Rebuild the sortition parameter window by walking backward over the
    /// last few blocks, recomputing the pool stake at each height from the
    /// current validator set minus bond transactions observed along the way,
    /// and feeding the entries oldest-first so the window matches what it
    /// would be had the node never stopped.
    fn restore_sortition(
        &self,
        store: &dyn Store,
        sortition: &mut Sortition,
        committee: &Committee,
    ) -> Result<(), StateError> {
        let mut total_stake: i128 = 0;
        store.iterate_validators(&mut |v| {
            total_stake += v.stake() as i128;
            false
        });

        let start = self
            .last_block_height
            .saturating_sub(SORTITION_WINDOW as u64);

        let mut params: Vec<SortitionParams> = Vec::new();
        let mut stake_changed: HashMap<ValidatorAddress, i128> = HashMap::new();
        let mut cert = self.last_certificate.clone();
        let mut cur_committers = committee.committers();

        let mut height = self.last_block_height;
        while height > start {
            let block = store.block(height)?;

            let mut committee_stake: i128 = 0;
            for num in &cur_committers {
                let val = store.validator_by_number(*num)?;
                committee_stake += val.stake() as i128;
                if let Some(changed) = stake_changed.get(&val.address()) {
                    committee_stake += changed;
                }
            }

            params.push(SortitionParams {
                block_hash: block.hash(),
                seed: block.header().sortition_seed,
                pool_stake: (total_stake - committee_stake).max(0) as u64,
            });

            for id in block.tx_ids() {
                let trx = store.transaction(id)?;
                if let Payload::Bond(pld) = trx.payload() {
                    // This stake entered after `height`; earlier pool
                    // snapshots must not count it.
                    total_stake -= pld.stake as i128;
                    *stake_changed.entry(pld.validator).or_insert(0) -= pld.stake as i128;
                }
            }

            if let Some(c) = &cert {
                cur_committers = c.committers().to_vec();
            }
            cert = block.prev_certificate().cloned();

            height -= 1;
        }

        for p in params.iter().rev() {
            sortition.set_params(p.block_hash, p.seed, p.pool_stake);
        }

        Ok(())
    }
}

/// Rebuild the committee as it stands after the last block.
///
/// The certificate's committer list gives the membership (in rotation order)
/// during the last height. The block's proposer sat `round` slots past that
/// height's round-0 proposer, so undoing the rotation locates the round-0
/// proposer; replaying `update` with the block's sortition joiners then
/// yields the current committee.
fn restore_committee(
    store: &dyn Store,
    block: &Block,
    certificate: &Certificate,
    committee_size: usize,
) -> Result<Committee, StateError> {
    let mut joined = Vec::new();
    for id in block.tx_ids() {
        let trx = store.transaction(id)?;
        if let Payload::Sortition(pld) = trx.payload() {
            joined.push(store.validator(&pld.address)?);
        }
    }

    let committers = certificate.committers();
    let n = committers.len();
    let mut proposer_index = 0usize;
    let mut validators = Vec::with_capacity(n);
    for (i, num) in committers.iter().enumerate() {
        let val = store.validator_by_number(*num)?;
        if block.header().proposer_address == val.address() {
            proposer_index = i;
        }
        validators.push(val);
    }

    // Inverse of the forward rotation rule.
    proposer_index = (proposer_index + n - (certificate.round() as usize % n)) % n;
    let proposer = validators[proposer_index].address();

    let mut committee = Committee::new(validators, committee_size, proposer)?;
    committee.update(certificate.round(), joined)?;
    Ok(committee)
}
