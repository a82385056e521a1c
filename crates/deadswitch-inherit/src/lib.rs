//! deadswitch inheritance
//!
//! Owner/heir succession for a custodial wallet.
//!
//! # Concepts
//!
//! - **Owner**: controls the wallet's funds and settings
//! - **Heir**: designated successor, may proclaim the owner dead
//! - **Heartbeat**: any owner operation proves presence and cancels a
//!   pending proclamation
//! - **Claim**: after the grace period the heir becomes the owner
//!
//! # Lifecycle
//!
//! ```text
//! owner: set_heir(H) ──▶ ... owner goes silent ...
//! heir:  proclaim_death() ──▶ time_of_death = now + heartbeat_timeout
//! heir:  claim_heir_ownership()  (now >= time_of_death)
//!        owner = H, heir = none, time_of_death = 0
//! ```

pub mod events;
pub mod heartbeat;
pub mod succession;
pub mod wallet;

#[cfg(test)]
pub(crate) mod test_utils;

pub use events::SuccessionEvent;
pub use heartbeat::{evaluate_heartbeat, HeartbeatAction, HeartbeatConfig, HeartbeatStatus};
pub use succession::{
    Role, SuccessionController, SuccessionError, SuccessionPhase, DEFAULT_HEARTBEAT_TIMEOUT,
};
pub use wallet::Wallet;
