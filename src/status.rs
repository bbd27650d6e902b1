//! The status state machine (component C).
//!
//! A record moves through a fixed set of states. The adjacency table below
//! is the single source of truth for which transitions are legal; nothing
//! else in the crate is allowed to special-case a transition.

use std::fmt;

/// Lifecycle state of a stored transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Held in memory, eligible for automatic broadcast.
    Stored,
    /// A later zero-value self-send at higher fees superseded this record.
    Canceled,
    /// A later same-payload transaction at higher fees superseded this one.
    SpedUp,
    /// The upstream node rejected the broadcast permanently (e.g. nonce
    /// too low); retrying would not help.
    Failed,
    /// Successfully handed to the upstream node.
    Broadcasted,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Stored => "STORED",
            Status::Canceled => "CANCELED",
            Status::SpedUp => "SPEDUP",
            Status::Failed => "FAILED",
            Status::Broadcasted => "BROADCASTED",
        };
        f.write_str(s)
    }
}

impl Status {
    /// Whether `self -> to` appears in the adjacency table.
    ///
    /// CANCELED -> SPEDUP is allowed so a wallet that issued a cancel-style
    /// transaction can still bump its predecessor through if it later
    /// decides to replace it with a real transaction instead.
    pub fn can_transition_to(self, to: Status) -> bool {
        matches!(
            (self, to),
            (Status::Stored, Status::Canceled)
                | (Status::Stored, Status::SpedUp)
                | (Status::Stored, Status::Failed)
                | (Status::Stored, Status::Broadcasted)
                | (Status::Canceled, Status::SpedUp)
        )
    }

    /// Only STORED records are eligible for automatic broadcast.
    pub fn is_stored(self) -> bool {
        matches!(self, Status::Stored)
    }
}
