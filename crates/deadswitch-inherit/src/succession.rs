//! Owner/heir succession state machine.
//!
//! Pure logic: no I/O, no clock, no storage. Every operation takes the
//! caller identity and the current time as arguments, so the host decides
//! where both come from.
//!
//! # States
//!
//! ```text
//!            proclaim_death (heir)
//!   Alive ─────────────────────────▶ DeathProclaimed
//!     ▲                                  │      │
//!     │      any owner operation         │      │ claim_heir_ownership (heir,
//!     └──────────────────────────────────┘      │ now >= time_of_death)
//!     ▲                                         │
//!     └──────── heir becomes owner ◀────────────┘
//! ```
//!
//! Every successful owner-authorized operation is an implicit heartbeat: it
//! clears the death marker. `last_heartbeat` is kept for monitoring only and
//! never gates an operation.

use crate::events::SuccessionEvent;
use deadswitch_core::{Address, Amount, Ledger, LedgerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Heartbeat timeout applied to a freshly created controller (seconds).
pub const DEFAULT_HEARTBEAT_TIMEOUT: u64 = 50_000;

/// The privileged role an operation requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Heir,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Heir => write!(f, "heir"),
        }
    }
}

/// Why an operation was rejected. Rejected operations never mutate state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuccessionError {
    #[error("Unauthorized: {caller} is not the {required}")]
    Unauthorized { caller: Address, required: Role },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No heir set")]
    NoHeirSet,

    #[error("Death not yet eligible: now {now}, claimable at {claimable_at}")]
    DeathNotYetEligible {
        now: u64,
        /// Zero when no death has been proclaimed
        claimable_at: u64,
    },

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: Amount, requested: Amount },

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for SuccessionError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds {
                available,
                requested,
                ..
            } => SuccessionError::InsufficientFunds {
                available,
                requested,
            },
            other => SuccessionError::Ledger(other),
        }
    }
}

/// Where the controller stands in the succession protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuccessionPhase {
    /// No death proclaimed
    Alive,
    /// The heir proclaimed death; claimable once `claimable_at` is reached
    DeathProclaimed { claimable_at: u64 },
}

/// Succession state for one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessionController {
    /// Ledger account holding the wallet's funds
    account: Address,
    owner: Address,
    heir: Option<Address>,
    heartbeat_timeout: u64,
    /// 0 = alive, otherwise the time at which the heir may claim
    time_of_death: u64,
    /// Last time the owner authorized an operation (creation counts)
    last_heartbeat: u64,
}

impl SuccessionController {
    /// Create a controller owned by `owner` with the default timeout.
    pub fn new(account: Address, owner: Address, now: u64) -> Self {
        Self {
            account,
            owner,
            heir: None,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            time_of_death: 0,
            last_heartbeat: now,
        }
    }

    /// Create a controller with a custom initial timeout.
    pub fn with_timeout(
        account: Address,
        owner: Address,
        heartbeat_timeout: u64,
        now: u64,
    ) -> Result<Self, SuccessionError> {
        if heartbeat_timeout == 0 {
            return Err(SuccessionError::InvalidArgument(
                "heartbeat timeout must be > 0".into(),
            ));
        }
        let mut controller = Self::new(account, owner, now);
        controller.heartbeat_timeout = heartbeat_timeout;
        Ok(controller)
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// The designated heir, or `None` when no heir is set
    pub fn heir(&self) -> Option<Address> {
        self.heir
    }

    pub fn heartbeat_timeout(&self) -> u64 {
        self.heartbeat_timeout
    }

    /// Zero while alive, otherwise the time at which the heir may claim
    pub fn time_of_death(&self) -> u64 {
        self.time_of_death
    }

    pub fn last_heartbeat(&self) -> u64 {
        self.last_heartbeat
    }

    pub fn phase(&self) -> SuccessionPhase {
        if self.time_of_death == 0 {
            SuccessionPhase::Alive
        } else {
            SuccessionPhase::DeathProclaimed {
                claimable_at: self.time_of_death,
            }
        }
    }

    /// Whether the heir could claim ownership at `now`
    pub fn is_claimable(&self, now: u64) -> bool {
        self.heir.is_some() && self.time_of_death != 0 && now >= self.time_of_death
    }

    /// Check the invariants of a controller that came from outside
    /// (deserialized state, for instance).
    pub fn validate(&self) -> Result<(), SuccessionError> {
        if self.heartbeat_timeout == 0 {
            return Err(SuccessionError::InvalidArgument(
                "heartbeat timeout must be > 0".into(),
            ));
        }
        if self.heir.is_none() && self.time_of_death != 0 {
            return Err(SuccessionError::InvalidArgument(
                "time of death set without an heir".into(),
            ));
        }
        if self.heir.is_some_and(|h| h.is_zero()) {
            return Err(SuccessionError::InvalidArgument(
                "heir must not be the zero address".into(),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Authorization
    // ========================================================================

    fn ensure_owner(&self, caller: &Address, op: &str) -> Result<(), SuccessionError> {
        if *caller != self.owner {
            log::warn!("Rejected {} from {}: not the owner", op, caller);
            return Err(SuccessionError::Unauthorized {
                caller: *caller,
                required: Role::Owner,
            });
        }
        Ok(())
    }

    fn ensure_heir(&self, caller: &Address, op: &str) -> Result<Address, SuccessionError> {
        match self.heir {
            Some(heir) if heir == *caller => Ok(heir),
            _ => {
                log::warn!("Rejected {} from {}: not the heir", op, caller);
                Err(SuccessionError::Unauthorized {
                    caller: *caller,
                    required: Role::Heir,
                })
            }
        }
    }

    /// Record owner presence. Called only after every guard of an owner
    /// operation has passed.
    fn touch(&mut self, now: u64) {
        if self.time_of_death != 0 {
            log::info!(
                "Owner {} is alive; cancelling death proclaimed for {}",
                self.owner,
                self.time_of_death
            );
        }
        self.time_of_death = 0;
        self.last_heartbeat = now;
    }

    // ========================================================================
    // Owner operations
    // ========================================================================

    /// Prove the owner is alive.
    pub fn heartbeat(
        &mut self,
        caller: &Address,
        now: u64,
    ) -> Result<SuccessionEvent, SuccessionError> {
        self.ensure_owner(caller, "heartbeat")?;
        self.touch(now);
        Ok(SuccessionEvent::Heartbeat {
            owner: self.owner,
            at: now,
        })
    }

    /// Designate `heir`, replacing any previous heir.
    pub fn set_heir(
        &mut self,
        caller: &Address,
        heir: Address,
        now: u64,
    ) -> Result<SuccessionEvent, SuccessionError> {
        self.ensure_owner(caller, "set_heir")?;
        if heir.is_zero() {
            return Err(SuccessionError::InvalidArgument(
                "heir must not be the zero address; use remove_heir".into(),
            ));
        }
        self.touch(now);
        let previous = self.heir.replace(heir);
        log::info!("Heir set to {}", heir);
        Ok(SuccessionEvent::HeirChanged { previous, heir })
    }

    /// Clear the heir and cancel any pending succession.
    pub fn remove_heir(
        &mut self,
        caller: &Address,
        now: u64,
    ) -> Result<SuccessionEvent, SuccessionError> {
        self.ensure_owner(caller, "remove_heir")?;
        self.touch(now);
        let previous = self.heir.take();
        log::info!("Heir removed");
        Ok(SuccessionEvent::HeirRemoved { previous })
    }

    /// Change the heartbeat timeout. An already proclaimed death keeps its
    /// original claim time (though the implicit heartbeat cancels it anyway).
    pub fn set_heartbeat_timeout(
        &mut self,
        caller: &Address,
        timeout: u64,
        now: u64,
    ) -> Result<SuccessionEvent, SuccessionError> {
        self.ensure_owner(caller, "set_heartbeat_timeout")?;
        if timeout == 0 {
            return Err(SuccessionError::InvalidArgument(
                "heartbeat timeout must be > 0".into(),
            ));
        }
        self.touch(now);
        let previous = std::mem::replace(&mut self.heartbeat_timeout, timeout);
        log::info!("Heartbeat timeout changed: {} -> {} secs", previous, timeout);
        Ok(SuccessionEvent::TimeoutChanged { previous, timeout })
    }

    /// Transfer `amount` from the wallet account to `recipient`.
    pub fn send_to<L: Ledger>(
        &mut self,
        caller: &Address,
        recipient: &Address,
        amount: Amount,
        now: u64,
        ledger: &mut L,
    ) -> Result<SuccessionEvent, SuccessionError> {
        self.ensure_owner(caller, "send_to")?;
        let available = ledger.balance_of(&self.account);
        if amount > available {
            return Err(SuccessionError::InsufficientFunds {
                available,
                requested: amount,
            });
        }
        ledger.transfer(&self.account, recipient, amount)?;
        self.touch(now);
        log::info!("Sent {} to {}", amount, recipient);
        Ok(SuccessionEvent::Sent {
            amount,
            to: *recipient,
        })
    }

    // ========================================================================
    // Open operations
    // ========================================================================

    /// Accept incoming funds from anyone. No effect on succession state.
    pub fn receive<L: Ledger>(
        &self,
        from: &Address,
        amount: Amount,
        ledger: &mut L,
    ) -> Result<SuccessionEvent, SuccessionError> {
        ledger.credit(&self.account, amount)?;
        log::info!("Received {} from {}", amount, from);
        Ok(SuccessionEvent::Received {
            amount,
            from: *from,
        })
    }

    // ========================================================================
    // Heir operations
    // ========================================================================

    /// Declare the owner absent. The heir may claim once
    /// `now + heartbeat_timeout` is reached. Calling again while already
    /// proclaimed restarts the grace period from `now`.
    pub fn proclaim_death(
        &mut self,
        caller: &Address,
        now: u64,
    ) -> Result<SuccessionEvent, SuccessionError> {
        if self.heir.is_none() {
            log::warn!("Rejected proclaim_death from {}: no heir set", caller);
            return Err(SuccessionError::NoHeirSet);
        }
        let heir = self.ensure_heir(caller, "proclaim_death")?;

        // Timeout is never zero, so neither is the result, even at now == 0.
        let claimable_at = now.saturating_add(self.heartbeat_timeout);
        let refreshed = self.time_of_death != 0;
        self.time_of_death = claimable_at;

        log::warn!(
            "Heir {} proclaimed death of owner {}; claimable at {}",
            heir,
            self.owner,
            claimable_at
        );
        Ok(SuccessionEvent::DeathProclaimed {
            heir,
            claimable_at,
            refreshed,
        })
    }

    /// Take over the owner role after the grace period. Funds stay in the
    /// wallet account; the new owner moves them with [`send_to`](Self::send_to).
    pub fn claim_heir_ownership(
        &mut self,
        caller: &Address,
        now: u64,
    ) -> Result<SuccessionEvent, SuccessionError> {
        let heir = self.ensure_heir(caller, "claim_heir_ownership")?;
        if self.time_of_death == 0 || now < self.time_of_death {
            return Err(SuccessionError::DeathNotYetEligible {
                now,
                claimable_at: self.time_of_death,
            });
        }

        let previous_owner = std::mem::replace(&mut self.owner, heir);
        self.heir = None;
        self.time_of_death = 0;
        self.last_heartbeat = now;

        log::warn!("Ownership claimed: {} -> {}", previous_owner, heir);
        Ok(SuccessionEvent::OwnershipClaimed {
            previous_owner,
            new_owner: heir,
        })
    }
}
