//! The replacement classifier (component D).
//!
//! Pure decision logic: given a newly submitted transaction and one
//! existing record, decide whether the new transaction looks like a
//! cancel or a speed-up of the existing one. Holds no lock and mutates
//! nothing; [`crate::store::Store::ingest`] drives this while holding the
//! store's mutex for the whole scan.
//!
//! The heuristics mirror wallet UI conventions: MetaMask's "cancel" issues
//! a zero-value self-send at higher fees, and "speed-up" reissues the same
//! transaction at higher fees. This is pattern matching on transaction
//! shape, not a protocol — a legitimate zero-value self-transfer at a
//! higher fee than some unrelated pending transaction would be
//! misclassified as a cancel of it. This is accepted because the
//! heuristic mirrors wallet UIs and a protocol extension would break
//! compatibility.

use crate::record::TransactionRecord;
use crate::tx::{Address, DecodedTransaction};

/// What an incoming transaction looks like relative to one existing
/// record at the same `(sender, nonce)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementKind {
    /// A zero-value, zero-data self-send at higher fees — intent is to
    /// cancel the predecessor, not to put this transaction on-chain.
    Cancel,
    /// Same recipient, value, and payload, at higher fees — intent is to
    /// rebroadcast the same transfer faster.
    SpeedUp,
}

/// Classify `new` against `old`, given `old`'s already-recovered sender
/// and the newly recovered sender of `new`. Returns `None` when `old` is
/// not a candidate predecessor (different signer, different nonce, or
/// fee caps that don't strictly exceed the predecessor's).
///
/// Caller is responsible for skipping records whose `old.sender()` fails
/// to recover (skip that record, without error) and for skipping records
/// already in SPEDUP status.
pub fn classify(
    new: &dyn DecodedTransaction,
    new_sender: &Address,
    old: &TransactionRecord,
    old_sender: &Address,
) -> Option<ReplacementKind> {
    if old_sender != new_sender || old.nonce() != new.nonce() {
        return None;
    }

    let old_cap = old.total_cap();
    let new_cap = new.total_cap();
    if new_cap <= old_cap {
        return None;
    }

    let is_cancel = new.to().as_deref() == Some(new_sender.as_str())
        && new.value() == 0
        && new.data().is_empty();
    if is_cancel {
        return Some(ReplacementKind::Cancel);
    }

    let is_speed_up =
        new.to() == old.to() && new.value() == old.value() && new.data() == old.data();
    if is_speed_up {
        return Some(ReplacementKind::SpeedUp);
    }

    None
}
