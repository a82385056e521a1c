//! Events emitted by successful succession operations

use deadswitch_core::{Address, Amount};
use serde::{Deserialize, Serialize};

/// What a successful operation did. Every mutating call returns exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuccessionEvent {
    /// Owner proved presence without changing anything else
    Heartbeat { owner: Address, at: u64 },

    /// Heir designated (or replaced)
    HeirChanged {
        previous: Option<Address>,
        heir: Address,
    },

    /// Heir cleared; any pending death proclamation cancelled
    HeirRemoved { previous: Option<Address> },

    /// Heartbeat timeout changed
    TimeoutChanged { previous: u64, timeout: u64 },

    /// Heir declared the owner absent
    DeathProclaimed {
        heir: Address,
        claimable_at: u64,
        /// True when this replaced an earlier proclamation
        refreshed: bool,
    },

    /// Heir took over the owner role
    OwnershipClaimed {
        previous_owner: Address,
        new_owner: Address,
    },

    /// Funds left the wallet
    Sent {
        amount: Amount,
        to: Address,
    },

    /// Funds arrived in the wallet
    Received {
        amount: Amount,
        from: Address,
    },
}

impl SuccessionEvent {
    /// Short machine-friendly name
    pub fn kind(&self) -> &'static str {
        match self {
            SuccessionEvent::Heartbeat { .. } => "heartbeat",
            SuccessionEvent::HeirChanged { .. } => "heir_changed",
            SuccessionEvent::HeirRemoved { .. } => "heir_removed",
            SuccessionEvent::TimeoutChanged { .. } => "timeout_changed",
            SuccessionEvent::DeathProclaimed { .. } => "death_proclaimed",
            SuccessionEvent::OwnershipClaimed { .. } => "ownership_claimed",
            SuccessionEvent::Sent { .. } => "sent",
            SuccessionEvent::Received { .. } => "received",
        }
    }

    /// Whether the event moved the wallet toward or through succession
    pub fn is_succession(&self) -> bool {
        matches!(
            self,
            SuccessionEvent::DeathProclaimed { .. } | SuccessionEvent::OwnershipClaimed { .. }
        )
    }
}
