//! Transactions for the Atria protocol.
//!
//! A transaction carries a `stamp` — the hash of a recent block — tying it to
//! a point in the chain, a per-signer `sequence` for replay protection, and a
//! tagged [`Payload`]. Sortition and unbond transactions are fee-free; all
//! others pay a positive fee.

pub mod error;
pub mod payload;

pub use error::TransactionError;
pub use payload::{
    BondPayload, Payload, PayloadKind, SendPayload, SortitionPayload, UnbondPayload,
    WithdrawPayload,
};

use atria_crypto::{address_from_public_key, hash_transaction, verify_signature, Signer};
use atria_sortition::SortitionProof;
use atria_types::{BlockHash, PublicKey, Signature, Stake, TxHash, ValidatorAddress};
use serde::{Deserialize, Serialize};

/// Current transaction format version.
pub const TX_VERSION: u32 = 1;

/// A signed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    version: u32,
    /// Hash of a recent block; pins the transaction to a chain segment.
    stamp: BlockHash,
    /// Signer's sequence number (previous sequence + 1).
    sequence: u64,
    fee: u64,
    payload: Payload,
    memo: String,
    public_key: Option<PublicKey>,
    signature: Option<Signature>,
}

/// The signed portion of a transaction (everything but key and signature).
#[derive(Serialize)]
struct SignBytes<'a> {
    version: u32,
    stamp: &'a BlockHash,
    sequence: u64,
    fee: u64,
    payload: &'a Payload,
    memo: &'a str,
}

impl Transaction {
    pub fn new(
        stamp: BlockHash,
        sequence: u64,
        fee: u64,
        payload: Payload,
        memo: impl Into<String>,
    ) -> Self {
        Self {
            version: TX_VERSION,
            stamp,
            sequence,
            fee,
            payload,
            memo: memo.into(),
            public_key: None,
            signature: None,
        }
    }

    pub fn new_send(
        stamp: BlockHash,
        sequence: u64,
        fee: u64,
        sender: ValidatorAddress,
        receiver: ValidatorAddress,
        amount: Stake,
        memo: impl Into<String>,
    ) -> Self {
        Self::new(
            stamp,
            sequence,
            fee,
            Payload::Send(SendPayload {
                sender,
                receiver,
                amount,
            }),
            memo,
        )
    }

    pub fn new_bond(
        stamp: BlockHash,
        sequence: u64,
        fee: u64,
        sender: ValidatorAddress,
        validator_key: PublicKey,
        stake: Stake,
        memo: impl Into<String>,
    ) -> Self {
        let validator = address_from_public_key(&validator_key);
        Self::new(
            stamp,
            sequence,
            fee,
            Payload::Bond(BondPayload {
                sender,
                validator,
                public_key: validator_key,
                stake,
            }),
            memo,
        )
    }

    pub fn new_unbond(stamp: BlockHash, sequence: u64, validator: ValidatorAddress) -> Self {
        Self::new(stamp, sequence, 0, Payload::Unbond(UnbondPayload { validator }), "")
    }

    pub fn new_withdraw(
        stamp: BlockHash,
        sequence: u64,
        fee: u64,
        validator: ValidatorAddress,
        receiver: ValidatorAddress,
        amount: Stake,
    ) -> Self {
        Self::new(
            stamp,
            sequence,
            fee,
            Payload::Withdraw(WithdrawPayload {
                validator,
                receiver,
                amount,
            }),
            "",
        )
    }

    pub fn new_sortition(
        stamp: BlockHash,
        sequence: u64,
        address: ValidatorAddress,
        proof: SortitionProof,
    ) -> Self {
        Self::new(
            stamp,
            sequence,
            0,
            Payload::Sortition(SortitionPayload { address, proof }),
            "",
        )
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn stamp(&self) -> &BlockHash {
        &self.stamp
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.public_key.as_ref()
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// The bytes covered by the signature.
    pub fn sign_bytes(&self) -> Vec<u8> {
        let view = SignBytes {
            version: self.version,
            stamp: &self.stamp,
            sequence: self.sequence,
            fee: self.fee,
            payload: &self.payload,
            memo: &self.memo,
        };
        bincode::serialize(&view).expect("transaction sign bytes are always serializable")
    }

    /// The transaction id: hash of the sign bytes.
    pub fn id(&self) -> TxHash {
        hash_transaction(&self.sign_bytes())
    }

    /// Sign the transaction, attaching public key and signature.
    pub fn sign(&mut self, signer: &Signer) {
        self.public_key = Some(signer.public_key().clone());
        self.signature = Some(signer.sign(&self.sign_bytes()));
    }

    pub fn is_send_tx(&self) -> bool {
        matches!(self.payload, Payload::Send(_))
    }

    pub fn is_bond_tx(&self) -> bool {
        matches!(self.payload, Payload::Bond(_))
    }

    pub fn is_unbond_tx(&self) -> bool {
        matches!(self.payload, Payload::Unbond(_))
    }

    pub fn is_withdraw_tx(&self) -> bool {
        matches!(self.payload, Payload::Withdraw(_))
    }

    pub fn is_sortition_tx(&self) -> bool {
        matches!(self.payload, Payload::Sortition(_))
    }

    /// Whether this transaction kind is exempt from fees.
    pub fn is_free_tx(&self) -> bool {
        self.is_sortition_tx() || self.is_unbond_tx()
    }

    /// Structural validation: version, fee rule, signature, payload.
    pub fn sanity_check(&self) -> Result<(), TransactionError> {
        if self.version != TX_VERSION {
            return Err(TransactionError::InvalidVersion(self.version));
        }
        self.check_fee()?;
        self.check_signature()?;
        self.payload.sanity_check()?;
        Ok(())
    }

    fn check_fee(&self) -> Result<(), TransactionError> {
        if self.is_free_tx() {
            if self.fee != 0 {
                let kind = if self.is_sortition_tx() { "sortition" } else { "unbond" };
                return Err(TransactionError::NonZeroFee(kind));
            }
        } else if self.fee == 0 {
            return Err(TransactionError::InvalidFee);
        }
        Ok(())
    }

    fn check_signature(&self) -> Result<(), TransactionError> {
        let public_key = self
            .public_key
            .as_ref()
            .ok_or(TransactionError::MissingPublicKey)?;
        let signature = self
            .signature
            .as_ref()
            .ok_or(TransactionError::MissingSignature)?;

        let signer = self.payload.signer();
        if address_from_public_key(public_key) != signer {
            return Err(TransactionError::SignerMismatch(signer.to_string()));
        }
        if !verify_signature(&self.sign_bytes(), signature, public_key) {
            return Err(TransactionError::InvalidSignature);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(byte: u8) -> BlockHash {
        BlockHash::new([byte; 32])
    }

    fn signer(byte: u8) -> Signer {
        Signer::from_seed(&[byte; 32])
    }

    #[test]
    fn signed_send_passes_sanity() {
        let s = signer(1);
        let receiver = signer(2).address();
        let mut tx = Transaction::new_send(hash(1), 1, 10, s.address(), receiver, 500, "rent");
        tx.sign(&s);
        tx.sanity_check().expect("valid transaction");
    }

    #[test]
    fn unsigned_transaction_fails() {
        let s = signer(1);
        let tx = Transaction::new_unbond(hash(1), 1, s.address());
        assert!(matches!(
            tx.sanity_check(),
            Err(TransactionError::MissingPublicKey)
        ));
    }

    #[test]
    fn tampered_transaction_fails_signature() {
        let s = signer(1);
        let receiver = signer(2).address();
        let mut tx = Transaction::new_send(hash(1), 1, 10, s.address(), receiver, 500, "");
        tx.sign(&s);
        tx.sequence += 1;
        assert!(matches!(
            tx.sanity_check(),
            Err(TransactionError::InvalidSignature)
        ));
    }

    #[test]
    fn wrong_signer_key_rejected() {
        let s = signer(1);
        let other = signer(2);
        // Payload claims `s` as sender, but `other` signs.
        let mut tx = Transaction::new_send(hash(1), 1, 10, s.address(), other.address(), 5, "");
        tx.sign(&other);
        assert!(matches!(
            tx.sanity_check(),
            Err(TransactionError::SignerMismatch(_))
        ));
    }

    #[test]
    fn free_transactions_must_have_zero_fee() {
        let s = signer(1);
        let mut tx = Transaction::new(
            hash(1),
            1,
            5,
            Payload::Unbond(UnbondPayload {
                validator: s.address(),
            }),
            "",
        );
        tx.sign(&s);
        assert!(matches!(
            tx.sanity_check(),
            Err(TransactionError::NonZeroFee("unbond"))
        ));
    }

    #[test]
    fn paid_transactions_must_have_positive_fee() {
        let s = signer(1);
        let receiver = signer(2).address();
        let mut tx = Transaction::new_send(hash(1), 1, 0, s.address(), receiver, 500, "");
        tx.sign(&s);
        assert!(matches!(tx.sanity_check(), Err(TransactionError::InvalidFee)));
    }

    #[test]
    fn zero_amount_send_rejected() {
        let s = signer(1);
        let receiver = signer(2).address();
        let mut tx = Transaction::new_send(hash(1), 1, 10, s.address(), receiver, 0, "");
        tx.sign(&s);
        assert!(matches!(
            tx.sanity_check(),
            Err(TransactionError::InvalidPayload(_))
        ));
    }

    #[test]
    fn id_is_stable_under_signing() {
        let s = signer(1);
        let mut tx = Transaction::new_unbond(hash(1), 3, s.address());
        let id_before = tx.id();
        tx.sign(&s);
        assert_eq!(tx.id(), id_before, "id covers sign bytes only");
    }

    #[test]
    fn payload_discriminant_round_trips() {
        let s = signer(1);
        let mut tx = Transaction::new_unbond(hash(1), 3, s.address());
        tx.sign(&s);
        let bytes = bincode::serialize(&tx).expect("serialize");
        let back: Transaction = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(back, tx);
        assert_eq!(back.payload().kind(), PayloadKind::Unbond);
    }

    #[test]
    fn sortition_tx_is_free_and_signed_by_its_validator() {
        let s = signer(1);
        let proof = SortitionProof::new(s.sign(b"seed"));
        let mut tx = Transaction::new_sortition(hash(1), 1, s.address(), proof);
        tx.sign(&s);
        assert!(tx.is_free_tx());
        tx.sanity_check().expect("valid sortition tx");
    }
}
