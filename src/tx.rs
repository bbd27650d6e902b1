//! The signed-transaction boundary.
//!
//! The binary transaction decoder is treated as an external library
//! already returning parsed objects with accessors. That boundary is named
//! as a trait so the core, and its tests, never depend on a concrete
//! RLP/secp256k1 implementation. Production deployments supply their own
//! [`DecodedTransaction`] backed by a real decoder; [`decoder::PlainTransaction`]
//! below exists only so this crate's own tests and examples have something
//! concrete to construct.

use crate::error::CoreError;

/// 32-byte transaction identifier, hex-encoded with a `0x` prefix.
pub type TxHash = String;

/// 20-byte account address, hex-encoded with a `0x` prefix.
pub type Address = String;

/// Accessors a decoded signed transaction must provide. Everything the
/// classifier and gas monitor need to reason about a transaction without
/// knowing how it was encoded on the wire.
pub trait DecodedTransaction: Send + Sync {
    /// 32-byte identifier, hex-encoded.
    fn hash(&self) -> TxHash;
    /// Per-sender sequence number.
    fn nonce(&self) -> u64;
    /// Address recovered from the signature under the transaction's own
    /// declared chain id. Fails if the signature does not recover cleanly.
    fn sender(&self) -> Result<Address, CoreError>;
    /// Recipient, or `None` for a contract-creation transaction.
    fn to(&self) -> Option<Address>;
    /// Value transferred, in wei.
    fn value(&self) -> u128;
    /// Maximum per-gas price the sender is willing to pay.
    fn gas_fee_cap(&self) -> u128;
    /// Maximum per-gas priority fee offered to block producers.
    fn gas_tip_cap(&self) -> u128;
    /// Call/deploy payload.
    fn data(&self) -> &[u8];
    /// Chain id the transaction was signed against.
    fn chain_id(&self) -> u64;

    /// Convenience used throughout the classifier and monitor: the total
    /// per-gas amount this transaction is willing to pay.
    fn total_cap(&self) -> u128 {
        self.gas_fee_cap().saturating_add(self.gas_tip_cap())
    }
}

pub mod decoder {
    //! A minimal, deliberately non-production [`DecodedTransaction`] impl.
    //!
    //! It is constructed directly from already-known fields, as unit and
    //! integration tests do, rather than decoded from raw RLP bytes. Real
    //! deployments plug in a decoder for the chain they front (e.g. one
    //! built on `rlp` + `secp256k1`), which is out of scope for this crate.

    use super::{Address, DecodedTransaction, TxHash};
    use crate::error::CoreError;

    /// A signed transaction already reduced to its semantic fields, plus a
    /// sender that "recovery" trivially returns (recovery failure is
    /// simulated by leaving `sender` empty).
    #[derive(Debug, Clone)]
    pub struct PlainTransaction {
        pub hash: TxHash,
        pub nonce: u64,
        pub sender: Option<Address>,
        pub to: Option<Address>,
        pub value: u128,
        pub gas_fee_cap: u128,
        pub gas_tip_cap: u128,
        pub data: Vec<u8>,
        pub chain_id: u64,
    }

    impl PlainTransaction {
        pub fn new(hash: impl Into<TxHash>, sender: impl Into<Address>, nonce: u64) -> Self {
            Self {
                hash: hash.into(),
                nonce,
                sender: Some(sender.into()),
                to: None,
                value: 0,
                gas_fee_cap: 0,
                gas_tip_cap: 0,
                data: Vec::new(),
                chain_id: 1,
            }
        }

        pub fn to(mut self, to: impl Into<Address>) -> Self {
            self.to = Some(to.into());
            self
        }

        pub fn value(mut self, value: u128) -> Self {
            self.value = value;
            self
        }

        pub fn caps(mut self, gas_fee_cap: u128, gas_tip_cap: u128) -> Self {
            self.gas_fee_cap = gas_fee_cap;
            self.gas_tip_cap = gas_tip_cap;
            self
        }

        pub fn data(mut self, data: impl Into<Vec<u8>>) -> Self {
            self.data = data.into();
            self
        }

        /// Simulates a transaction whose signature cannot be recovered.
        pub fn unrecoverable(mut self) -> Self {
            self.sender = None;
            self
        }
    }

    impl DecodedTransaction for PlainTransaction {
        fn hash(&self) -> TxHash {
            self.hash.clone()
        }

        fn nonce(&self) -> u64 {
            self.nonce
        }

        fn sender(&self) -> Result<Address, CoreError> {
            self.sender.clone().ok_or(CoreError::Unprocessable)
        }

        fn to(&self) -> Option<Address> {
            self.to.clone()
        }

        fn value(&self) -> u128 {
            self.value
        }

        fn gas_fee_cap(&self) -> u128 {
            self.gas_fee_cap
        }

        fn gas_tip_cap(&self) -> u128 {
            self.gas_tip_cap
        }

        fn data(&self) -> &[u8] {
            &self.data
        }

        fn chain_id(&self) -> u64 {
            self.chain_id
        }
    }
}
