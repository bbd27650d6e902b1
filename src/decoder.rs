//! A non-production stand-in for the signed-transaction decoder, which
//! this crate treats as an external library (see `crate::tx` module docs).
//!
//! Real deployments decode RLP-encoded, secp256k1-signed transactions;
//! that decoder is out of scope for this crate. This one instead trusts
//! a wire-provided JSON object — hex-encoded the same way
//! a real raw transaction would be, so it still round-trips through the
//! `^0x[0-9a-fA-F]+$` validation the front end applies to every
//! `eth_sendRawTransaction` payload — carrying the fields a real decoder
//! would have already recovered, including `hash` and `sender`. It exists
//! only so this crate's own binary and integration tests have something
//! concrete to decode; it is not meant to be trusted as a signature
//! verifier.

use serde::Deserialize;

use crate::error::CoreError;
use crate::tx::decoder::PlainTransaction;
use crate::tx::DecodedTransaction;

/// Turns a raw `0x`-prefixed hex payload into a [`DecodedTransaction`].
/// Injected into the front end so the HTTP layer never depends on a
/// concrete decoding scheme.
pub trait TransactionDecoder: Send + Sync {
    fn decode(&self, raw_hex: &str) -> Result<Box<dyn DecodedTransaction>, CoreError>;
}

#[derive(Deserialize)]
struct WireTransaction {
    hash: String,
    nonce: u64,
    sender: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    value: u128,
    gas_fee_cap: u128,
    gas_tip_cap: u128,
    #[serde(default)]
    data: String,
    #[serde(default = "default_chain_id")]
    chain_id: u64,
}

fn default_chain_id() -> u64 {
    1
}

/// Decodes the hex-wrapped wire format described in the module doc.
pub struct WireTransactionDecoder;

impl TransactionDecoder for WireTransactionDecoder {
    fn decode(&self, raw_hex: &str) -> Result<Box<dyn DecodedTransaction>, CoreError> {
        let digits = raw_hex.strip_prefix("0x").ok_or(CoreError::Unprocessable)?;
        let bytes = hex::decode(digits).map_err(|_| CoreError::Unprocessable)?;
        let wire: WireTransaction =
            serde_json::from_slice(&bytes).map_err(|_| CoreError::Unprocessable)?;

        let data = if wire.data.is_empty() {
            Vec::new()
        } else {
            hex::decode(wire.data.trim_start_matches("0x")).map_err(|_| CoreError::Unprocessable)?
        };

        let mut tx = PlainTransaction {
            hash: wire.hash,
            nonce: wire.nonce,
            sender: wire.sender,
            to: wire.to,
            value: wire.value,
            gas_fee_cap: wire.gas_fee_cap,
            gas_tip_cap: wire.gas_tip_cap,
            data,
            chain_id: wire.chain_id,
        };
        if tx.hash.is_empty() {
            return Err(CoreError::Unprocessable);
        }
        if !tx.hash.starts_with("0x") {
            tx.hash = format!("0x{}", tx.hash);
        }

        Ok(Box::new(tx))
    }
}
