//! [`TransactionRecord`]: the envelope the store keeps for each transaction.

use crate::status::Status;
use crate::tx::{Address, DecodedTransaction, TxHash};

/// A decoded signed transaction plus the bookkeeping the store needs:
/// its current lifecycle status and the verbatim hex it was submitted as
/// (kept around so the gas monitor can rebroadcast it later without
/// re-encoding anything).
pub struct TransactionRecord {
    inner: Box<dyn DecodedTransaction>,
    pub status: Status,
    pub raw_hex: String,
    /// Monotonic insertion sequence, used only for stable iteration in
    /// tests and diagnostics. Not part of any invariant; the classifier
    /// and monitor never read it.
    pub received_at: u64,
}

impl TransactionRecord {
    pub fn new(inner: Box<dyn DecodedTransaction>, raw_hex: String, received_at: u64) -> Self {
        Self {
            inner,
            status: Status::Stored,
            raw_hex,
            received_at,
        }
    }

    pub fn hash(&self) -> TxHash {
        self.inner.hash()
    }

    pub fn nonce(&self) -> u64 {
        self.inner.nonce()
    }

    pub fn sender(&self) -> Result<Address, crate::error::CoreError> {
        self.inner.sender()
    }

    pub fn to(&self) -> Option<Address> {
        self.inner.to()
    }

    pub fn value(&self) -> u128 {
        self.inner.value()
    }

    pub fn data(&self) -> &[u8] {
        self.inner.data()
    }

    pub fn total_cap(&self) -> u128 {
        self.inner.total_cap()
    }

    pub fn chain_id(&self) -> u64 {
        self.inner.chain_id()
    }
}
