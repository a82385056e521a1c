//! deadswitch core
//!
//! Shared types for the dead man's switch wallet.
//!
//! # Collaborators
//!
//! The succession state machine never touches storage or the system clock
//! directly. It talks to two collaborators defined here:
//!
//! - [`Ledger`]: account balances, transfers and credits
//! - [`Clock`]: the current time in seconds
//!
//! Identities are [`Address`] values: the HASH160 of a secp256k1 public key.

pub mod address;
pub mod clock;
pub mod ledger;

pub use address::{Address, AddressError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::{Ledger, LedgerError, MemoryLedger};

pub use bitcoin::Amount;
