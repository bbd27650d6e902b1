//! Error types surfaced by the transaction-lifecycle core.

use thiserror::Error;

use crate::status::Status;

/// Errors produced by the status state machine and the ingest/cancel entry
/// points. These never corrupt the store: any variant here means the store
/// was left exactly as it was on entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// `hash` was already present in the store when `ingest` ran.
    #[error("already {0}")]
    Duplicate(Status),

    /// `hash` is not known to the store.
    #[error("transaction not found")]
    NotFound,

    /// `(from, to)` is not a permitted entry in the status adjacency table.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },

    /// The new transaction's sender could not be recovered from its
    /// signature; ingest aborts without mutating the store.
    #[error("could not recover transaction sender")]
    Unprocessable,
}

/// Errors talking to the upstream execution node.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Network, HTTP status, or JSON decoding failure. Distinguished from
    /// [`UpstreamError::Rpc`] because the gas monitor treats this as
    /// transient and retries on the next tick.
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream node answered with a well-formed JSON-RPC `error`
    /// object. The message is preserved verbatim.
    #[error("upstream rpc error: {0}")]
    Rpc(String),

    /// The upstream response body was not a decodable JSON-RPC envelope,
    /// or its `result` field was not the expected shape (e.g. not a hex
    /// integer for `eth_gasPrice`).
    #[error("malformed upstream response: {0}")]
    Decode(String),

    /// The request was aborted by the caller's cancellation signal.
    #[error("upstream call canceled")]
    Canceled,
}
