//! Owner heartbeat evaluation.
//!
//! Pure logic: takes controller state and the current time, returns a
//! recommendation. The caller (daemon, CLI) decides whether to act on it.
//!
//! # How It Works
//!
//! Every owner operation records a heartbeat. The evaluation measures how
//! much of the heartbeat timeout has elapsed since then:
//!
//! ```text
//! |--- Healthy ---|--- CheckinRecommended ---|--- CheckinRequired ---|--- Overdue
//! 0%             50%                        90%                    100%
//! ```
//!
//! Once the heir proclaims death the timeline switches to the grace period:
//! `DeathProclaimed` until the claim time, then `Claimable`.
//!
//! Thresholds are configurable.

use crate::succession::{SuccessionController, SuccessionPhase};
use deadswitch_core::Address;
use serde::{Deserialize, Serialize};

/// When to recommend a check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Fraction of the timeout elapsed before recommending a heartbeat
    /// (0.0–1.0). Default: 0.5.
    pub checkin_threshold: f64,

    /// Fraction of the timeout elapsed before a heartbeat is critical
    /// (0.0–1.0). Default: 0.9.
    pub critical_threshold: f64,

    /// How often the caller should re-evaluate (seconds). Advisory only.
    /// Default: 3600.
    pub poll_interval_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            checkin_threshold: 0.5,
            critical_threshold: 0.9,
            poll_interval_secs: 3600,
        }
    }
}

impl HeartbeatConfig {
    /// Validate that thresholds are sensible.
    pub fn validate(&self) -> Result<(), HeartbeatError> {
        if self.checkin_threshold <= 0.0 || self.checkin_threshold >= 1.0 {
            return Err(HeartbeatError::InvalidThreshold(
                "checkin_threshold must be between 0.0 and 1.0 exclusive".into(),
            ));
        }
        if self.critical_threshold <= self.checkin_threshold || self.critical_threshold >= 1.0 {
            return Err(HeartbeatError::InvalidThreshold(
                "critical_threshold must be between checkin_threshold and 1.0 exclusive".into(),
            ));
        }
        Ok(())
    }
}

/// What the heartbeat recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeartbeatAction {
    /// Owner was seen recently. No action needed.
    Healthy,
    /// Passed the check-in threshold. Owner should check in soon.
    CheckinRecommended,
    /// Passed the critical threshold. Owner must check in now.
    CheckinRequired,
    /// Owner silent for longer than the timeout. The heir may proclaim death.
    Overdue,
    /// Heir proclaimed death; owner can still cancel by acting.
    DeathProclaimed,
    /// Grace period over. The heir can claim ownership.
    Claimable,
}

impl HeartbeatAction {
    /// Whether the owner should be told to act
    pub fn needs_owner_attention(self) -> bool {
        !matches!(self, HeartbeatAction::Healthy | HeartbeatAction::Claimable)
    }
}

/// Full heartbeat status for a wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatStatus {
    pub owner: Address,
    pub heir: Option<Address>,
    /// Seconds since the owner last authorized an operation
    pub secs_since_heartbeat: u64,
    /// Fraction of the heartbeat timeout elapsed (0.0–1.0+)
    pub elapsed_fraction: f64,
    /// Seconds left in the grace period, when death has been proclaimed
    pub secs_until_claimable: Option<u64>,
    /// Recommended action.
    pub action: HeartbeatAction,
}

/// Errors from heartbeat evaluation.
#[derive(Debug, thiserror::Error)]
pub enum HeartbeatError {
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
}

/// Evaluate the heartbeat status of a wallet at `now`.
pub fn evaluate_heartbeat(
    controller: &SuccessionController,
    now: u64,
    config: &HeartbeatConfig,
) -> HeartbeatStatus {
    let secs_since_heartbeat = now.saturating_sub(controller.last_heartbeat());
    let timeout = controller.heartbeat_timeout();
    let elapsed_fraction = if timeout == 0 {
        1.0
    } else {
        secs_since_heartbeat as f64 / timeout as f64
    };

    let (action, secs_until_claimable) = match controller.phase() {
        SuccessionPhase::DeathProclaimed { claimable_at } if now >= claimable_at => {
            (HeartbeatAction::Claimable, Some(0))
        }
        SuccessionPhase::DeathProclaimed { claimable_at } => (
            HeartbeatAction::DeathProclaimed,
            Some(claimable_at - now),
        ),
        SuccessionPhase::Alive => {
            let action = if elapsed_fraction >= 1.0 {
                HeartbeatAction::Overdue
            } else if elapsed_fraction >= config.critical_threshold {
                HeartbeatAction::CheckinRequired
            } else if elapsed_fraction >= config.checkin_threshold {
                HeartbeatAction::CheckinRecommended
            } else {
                HeartbeatAction::Healthy
            };
            (action, None)
        }
    };

    HeartbeatStatus {
        owner: controller.owner(),
        heir: controller.heir(),
        secs_since_heartbeat,
        elapsed_fraction,
        secs_until_claimable,
        action,
    }
}
