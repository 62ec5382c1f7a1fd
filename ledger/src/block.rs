//! Block structure: header plus transaction id list.

use atria_crypto::hash_block;
use atria_sortition::VerifiableSeed;
use atria_types::{BlockHash, Timestamp, TxHash, ValidatorAddress};
use serde::{Deserialize, Serialize};

use crate::certificate::Certificate;
use crate::error::LedgerError;

/// Block header.
///
/// `prev_cert_hash` commits the header (and therefore the block hash) to the
/// embedded previous certificate; `sortition_seed` must equal the previous
/// seed advanced by that certificate's hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    pub height: u64,
    pub time: Timestamp,
    pub prev_block_hash: BlockHash,
    pub sortition_seed: VerifiableSeed,
    pub proposer_address: ValidatorAddress,
    pub prev_cert_hash: BlockHash,
}

/// A block: header, the certificate that finalized the previous block, and
/// the ids of the transactions it carries. Immutable once finalized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    header: BlockHeader,
    prev_certificate: Option<Certificate>,
    tx_ids: Vec<TxHash>,
}

impl Block {
    pub fn new(
        header: BlockHeader,
        prev_certificate: Option<Certificate>,
        tx_ids: Vec<TxHash>,
    ) -> Self {
        Self {
            header,
            prev_certificate,
            tx_ids,
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn prev_certificate(&self) -> Option<&Certificate> {
        self.prev_certificate.as_ref()
    }

    pub fn tx_ids(&self) -> &[TxHash] {
        &self.tx_ids
    }

    /// The block hash: Blake2b over the serialized header.
    ///
    /// The header commits to the previous certificate through
    /// `prev_cert_hash`, so the hash covers the whole block.
    pub fn hash(&self) -> BlockHash {
        let bytes =
            bincode::serialize(&self.header).expect("block header is always serializable");
        hash_block(&bytes)
    }

    /// Structural validation of the header/certificate linkage.
    pub fn sanity_check(&self) -> Result<(), LedgerError> {
        if self.header.height == 0 {
            return Err(LedgerError::InvalidHeight(0));
        }
        if self.header.height == 1 {
            if self.prev_certificate.is_some() {
                return Err(LedgerError::UnexpectedPrevCertificate);
            }
            if !self.header.prev_cert_hash.is_undef() {
                return Err(LedgerError::CertificateMismatch(
                    "first block carries a previous-certificate hash".into(),
                ));
            }
            return Ok(());
        }

        let cert = self
            .prev_certificate
            .as_ref()
            .ok_or(LedgerError::MissingPrevCertificate(self.header.height))?;
        cert.sanity_check()?;
        if cert.hash() != self.header.prev_cert_hash {
            return Err(LedgerError::CertificateMismatch(
                "header does not commit to the embedded certificate".into(),
            ));
        }
        if *cert.block_hash() != self.header.prev_block_hash {
            return Err(LedgerError::CertificateMismatch(
                "certificate does not certify the previous block".into(),
            ));
        }
        if cert.height() + 1 != self.header.height {
            return Err(LedgerError::CertificateMismatch(format!(
                "certificate height {} under block height {}",
                cert.height(),
                self.header.height
            )));
        }
        Ok(())
    }
}
