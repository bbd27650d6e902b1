//! The transaction store (component B) and the sole write path into it,
//! ingest and cancel (component E), built directly on top of it.
//!
//! A single [`tokio::sync::Mutex`] guards the whole map. `ingest`'s
//! check-duplicate / scan-for-predecessor / insert sequence runs under one
//! lock acquisition for its full duration, which is what makes "no two
//! STORED records share `(sender, nonce)`" an actual invariant rather than
//! a race. The gas monitor, by contrast, only ever takes a snapshot under
//! the lock and releases it before doing any network I/O — see
//! [`Store::snapshot_stored`] and `crate::monitor`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::classifier::{classify, ReplacementKind};
use crate::error::CoreError;
use crate::record::TransactionRecord;
use crate::status::Status;
use crate::tx::{DecodedTransaction, TxHash};

/// A STORED record's hash, raw hex, and fee caps, copied out from under
/// the lock so the gas monitor can decide and broadcast without holding
/// it across network I/O.
#[derive(Debug, Clone)]
pub struct BroadcastCandidate {
    pub hash: TxHash,
    pub raw_hex: String,
    pub total_cap: u128,
}

/// Mapping from transaction hash to [`TransactionRecord`]; the only
/// authoritative state in the process.
#[derive(Default)]
pub struct Store {
    records: Mutex<HashMap<TxHash, TransactionRecord>>,
    sequence: AtomicU64,
}

impl Store {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Number of records currently held, of any status.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Current status of a record, if known.
    pub async fn status_of(&self, hash: &str) -> Option<Status> {
        self.records.lock().await.get(hash).map(|r| r.status)
    }

    /// Apply a status transition, validated against the adjacency table.
    /// Fails with [`CoreError::NotFound`] if `hash` is unknown, or
    /// [`CoreError::InvalidTransition`] if the table forbids it. The store
    /// is unchanged on either error.
    pub async fn change_status(&self, hash: &str, to: Status) -> Result<(), CoreError> {
        let mut records = self.records.lock().await;
        apply_transition(&mut records, hash, to)
    }

    /// `cancel(hash)`: a thin wrapper over `change_status(hash, CANCELED)`.
    pub async fn cancel(&self, hash: &str) -> Result<(), CoreError> {
        self.change_status(hash, Status::Canceled).await
    }

    /// The sole write path for new records (component E). Runs the
    /// replacement classifier (component D) against every eligible
    /// existing record under one lock acquisition, then either mutates an
    /// existing record's status or inserts `tx` as a fresh STORED record.
    ///
    /// Returns the hash of `tx` itself in every success case, even when a
    /// cancel pattern causes `tx` to be dropped rather than stored — the
    /// caller (the JSON-RPC front end) is meant to echo that hash back to
    /// the wallet exactly as a real node would, since the client cannot
    /// tell whether its transaction was actually broadcast.
    pub async fn ingest(
        &self,
        tx: Box<dyn DecodedTransaction>,
        raw_hex: String,
    ) -> Result<TxHash, CoreError> {
        let hash = tx.hash();
        let mut records = self.records.lock().await;

        if let Some(existing) = records.get(&hash) {
            return Err(CoreError::Duplicate(existing.status));
        }

        let new_sender = tx.sender().map_err(|_| CoreError::Unprocessable)?;

        // Scan read-only first: the map can't be borrowed immutably by the
        // iterator and mutably by `apply_transition`/`insert` at the same
        // time, so the decision (which old record, what kind of match) is
        // computed and collected before any mutation is attempted. This
        // preserves the original iteration order and the one-decision-per-
        // record shape of the scan.
        let candidates: Vec<(TxHash, ReplacementKind)> = records
            .iter()
            .filter(|(_, old_record)| old_record.status != Status::SpedUp)
            .filter_map(|(old_hash, old_record)| {
                let old_sender = old_record.sender().ok()?;
                classify(tx.as_ref(), &new_sender, old_record, &old_sender)
                    .map(|kind| (old_hash.clone(), kind))
            })
            .collect();

        for (old_hash, kind) in candidates {
            match kind {
                ReplacementKind::Cancel => {
                    match apply_transition(&mut records, &old_hash, Status::Canceled) {
                        Ok(()) => return Ok(hash),
                        Err(CoreError::InvalidTransition { .. }) => continue,
                        Err(other) => return Err(other),
                    }
                }
                ReplacementKind::SpeedUp => {
                    apply_transition(&mut records, &old_hash, Status::SpedUp)?;
                    let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
                    records.insert(hash.clone(), TransactionRecord::new(tx, raw_hex, seq));
                    return Ok(hash);
                }
            }
        }

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        records.insert(hash.clone(), TransactionRecord::new(tx, raw_hex, seq));
        Ok(hash)
    }

    /// Snapshot every STORED record's hash, raw hex, and fee cap total.
    /// Used exclusively by the gas monitor, which must not hold the store
    /// lock across upstream network calls.
    pub async fn snapshot_stored(&self) -> Vec<BroadcastCandidate> {
        let records = self.records.lock().await;
        records
            .values()
            .filter(|r| r.status.is_stored())
            .map(|r| BroadcastCandidate {
                hash: r.hash(),
                raw_hex: r.raw_hex.clone(),
                total_cap: r.total_cap(),
            })
            .collect()
    }
}

/// Validates and applies one transition directly against an already-locked
/// map. Shared by [`Store::change_status`] (which locks first) and
/// [`Store::ingest`] (which is already holding the lock for its whole
/// duration).
fn apply_transition(
    records: &mut HashMap<TxHash, TransactionRecord>,
    hash: &str,
    to: Status,
) -> Result<(), CoreError> {
    let record = records.get_mut(hash).ok_or(CoreError::NotFound)?;
    if !record.status.can_transition_to(to) {
        return Err(CoreError::InvalidTransition {
            from: record.status,
            to,
        });
    }
    record.status = to;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::decoder::PlainTransaction;

    fn tx(hash: &str, sender: &str, nonce: u64) -> Box<PlainTransaction> {
        Box::new(PlainTransaction::new(hash, sender, nonce))
    }

    #[tokio::test]
    async fn fresh_ingest_is_stored() {
        let store = Store::new();
        let h = store
            .ingest(tx("0x1", "0xs", 0), "0xraw".into())
            .await
            .unwrap();
        assert_eq!(store.status_of(&h).await, Some(Status::Stored));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn duplicate_hash_is_rejected_with_existing_status() {
        let store = Store::new();
        store
            .ingest(tx("0x1", "0xs", 0), "0xraw".into())
            .await
            .unwrap();
        let err = store.ingest(tx("0x1", "0xs", 0), "0xraw".into()).await;
        assert_eq!(err, Err(CoreError::Duplicate(Status::Stored)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn cancel_then_ingest_reports_canceled_duplicate() {
        let store = Store::new();
        let h = store
            .ingest(tx("0x1", "0xs", 0), "0xraw".into())
            .await
            .unwrap();
        store.cancel(&h).await.unwrap();
        let err = store.ingest(tx("0x1", "0xs", 0), "0xraw".into()).await;
        assert_eq!(err, Err(CoreError::Duplicate(Status::Canceled)));
    }

    #[tokio::test]
    async fn unrecoverable_sender_aborts_without_mutating_store() {
        let store = Store::new();
        let bad: Box<dyn DecodedTransaction> =
            Box::new(PlainTransaction::new("0x1", "0xs", 0).unrecoverable());
        let err = store.ingest(bad, "0xraw".into()).await;
        assert_eq!(err, Err(CoreError::Unprocessable));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn cancel_pattern_drops_the_cancel_transaction() {
        let store = Store::new();
        let h1 = store
            .ingest(
                Box::new(
                    PlainTransaction::new("0x1", "0xs", 7)
                        .to("0xb")
                        .value(100)
                        .caps(10, 0),
                ),
                "0xraw1".into(),
            )
            .await
            .unwrap();

        let h2 = store
            .ingest(
                Box::new(
                    PlainTransaction::new("0x2", "0xs", 7)
                        .to("0xs")
                        .value(0)
                        .caps(20, 0),
                ),
                "0xraw2".into(),
            )
            .await
            .unwrap();

        assert_eq!(store.status_of(&h1).await, Some(Status::Canceled));
        assert_eq!(store.status_of(&h2).await, None);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn speed_up_pattern_swaps_predecessor_status() {
        let store = Store::new();
        let h1 = store
            .ingest(
                Box::new(
                    PlainTransaction::new("0x1", "0xs", 7)
                        .to("0xb")
                        .value(100)
                        .caps(10, 0)
                        .data(vec![9]),
                ),
                "0xraw1".into(),
            )
            .await
            .unwrap();

        let h2 = store
            .ingest(
                Box::new(
                    PlainTransaction::new("0x2", "0xs", 7)
                        .to("0xb")
                        .value(100)
                        .caps(20, 0)
                        .data(vec![9]),
                ),
                "0xraw2".into(),
            )
            .await
            .unwrap();

        assert_eq!(store.status_of(&h1).await, Some(Status::SpedUp));
        assert_eq!(store.status_of(&h2).await, Some(Status::Stored));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn same_nonce_lower_cap_is_stored_fresh_not_replaced() {
        let store = Store::new();
        store
            .ingest(
                Box::new(
                    PlainTransaction::new("0x1", "0xs", 7)
                        .to("0xb")
                        .value(100)
                        .caps(10, 0),
                ),
                "0xraw1".into(),
            )
            .await
            .unwrap();

        let h2 = store
            .ingest(
                Box::new(
                    PlainTransaction::new("0x2", "0xs", 7)
                        .to("0xb")
                        .value(100)
                        .caps(10, 0),
                ),
                "0xraw2".into(),
            )
            .await
            .unwrap();

        assert_eq!(store.status_of(&h2).await, Some(Status::Stored));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn spedup_records_are_not_candidates_for_further_replacement() {
        let store = Store::new();
        let h1 = store
            .ingest(
                Box::new(
                    PlainTransaction::new("0x1", "0xs", 7)
                        .to("0xb")
                        .value(100)
                        .caps(10, 0),
                ),
                "0xraw1".into(),
            )
            .await
            .unwrap();
        store
            .ingest(
                Box::new(
                    PlainTransaction::new("0x2", "0xs", 7)
                        .to("0xb")
                        .value(100)
                        .caps(20, 0),
                ),
                "0xraw2".into(),
            )
            .await
            .unwrap();
        assert_eq!(store.status_of(&h1).await, Some(Status::SpedUp));

        // A third transaction at the same (sender, nonce) and higher fee
        // should match the live successor (0x2), not 0x1 which is SPEDUP.
        let h3 = store
            .ingest(
                Box::new(
                    PlainTransaction::new("0x3", "0xs", 7)
                        .to("0xb")
                        .value(100)
                        .caps(30, 0),
                ),
                "0xraw3".into(),
            )
            .await
            .unwrap();
        assert_eq!(store.status_of(&h1).await, Some(Status::SpedUp));
        assert_eq!(store.status_of(&h3).await, Some(Status::Stored));
    }

    #[tokio::test]
    async fn cancel_twice_is_invalid_transition_and_stays_canceled() {
        let store = Store::new();
        let h = store
            .ingest(tx("0x1", "0xs", 0), "0xraw".into())
            .await
            .unwrap();
        store.cancel(&h).await.unwrap();
        let err = store.cancel(&h).await;
        assert_eq!(
            err,
            Err(CoreError::InvalidTransition {
                from: Status::Canceled,
                to: Status::Canceled,
            })
        );
        assert_eq!(store.status_of(&h).await, Some(Status::Canceled));
    }

    #[tokio::test]
    async fn change_status_on_unknown_hash_is_not_found() {
        let store = Store::new();
        let err = store.change_status("0xmissing", Status::Failed).await;
        assert_eq!(err, Err(CoreError::NotFound));
    }
}
