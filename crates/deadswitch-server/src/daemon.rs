//! The daemon loop: periodically evaluates the owner's heartbeat and logs
//! what the owner and heir should do next.

use crate::commands::load_state;
use crate::config::ServerConfig;
use anyhow::{Context, Result};
use deadswitch_core::{Clock, SystemClock};
use deadswitch_inherit::{evaluate_heartbeat, HeartbeatAction, HeartbeatStatus};
use std::time::Duration;

/// Run the daemon loop. Blocks forever (until shutdown signal).
pub async fn run(config: ServerConfig) -> Result<()> {
    log::info!("deadswitch server starting…");
    log::info!("  Wallet:     {}", config.wallet.label);
    log::info!(
        "  Interval:   {} seconds ({:.1} hours)",
        config.server.check_interval_secs,
        config.server.check_interval_secs as f64 / 3600.0
    );
    log::info!("  State file: {}", config.state_path().display());

    std::fs::create_dir_all(&config.server.data_dir).with_context(|| {
        format!(
            "Failed to create data dir: {}",
            config.server.data_dir.display()
        )
    })?;

    let interval = Duration::from_secs(config.server.check_interval_secs);

    // Run first check immediately, then loop
    let mut first = true;
    loop {
        if !first {
            log::info!(
                "Sleeping {} seconds until next check…",
                config.server.check_interval_secs
            );
            tokio::time::sleep(interval).await;
        }
        first = false;

        match run_check_cycle(&config).await {
            Ok(status) => log::info!("Check cycle completed: {:?}", status.action),
            Err(e) => log::error!("Check cycle failed: {:#}", e),
        }
    }
}

/// Execute a single check cycle: load state, evaluate heartbeat, report.
pub async fn run_check_cycle(config: &ServerConfig) -> Result<HeartbeatStatus> {
    log::info!("Starting check cycle…");

    let state = load_state(config)?;
    let now = SystemClock.now();
    let status = evaluate_heartbeat(&state.controller, now, &config.heartbeat_config());

    report(config, &status, state.controller.heartbeat_timeout());
    Ok(status)
}

fn report(config: &ServerConfig, status: &HeartbeatStatus, timeout: u64) {
    let label = &config.wallet.label;
    let remaining = timeout.saturating_sub(status.secs_since_heartbeat);

    match status.action {
        HeartbeatAction::Healthy => {
            log::info!(
                "[{}] Owner {} healthy: last heartbeat {} secs ago ({:.0}% of timeout)",
                label,
                status.owner,
                status.secs_since_heartbeat,
                status.elapsed_fraction * 100.0
            );
        }
        HeartbeatAction::CheckinRecommended => {
            log::warn!(
                "[{}] Owner {} should check in: {} secs left before the heir may act",
                label,
                status.owner,
                remaining
            );
        }
        HeartbeatAction::CheckinRequired => {
            log::warn!(
                "[{}] ⚠️  Owner {} must check in now: {} secs left",
                label,
                status.owner,
                remaining
            );
        }
        HeartbeatAction::Overdue => match status.heir {
            Some(heir) => log::warn!(
                "[{}] 🔴 Owner {} overdue by {} secs; heir {} may proclaim death",
                label,
                status.owner,
                status.secs_since_heartbeat.saturating_sub(timeout),
                heir
            ),
            None => log::warn!(
                "[{}] Owner {} overdue, but no heir is set",
                label,
                status.owner
            ),
        },
        HeartbeatAction::DeathProclaimed => {
            log::warn!(
                "[{}] 🔴 Death proclaimed: owner {} has {} secs to act before the heir can claim",
                label,
                status.owner,
                status.secs_until_claimable.unwrap_or(0)
            );
        }
        HeartbeatAction::Claimable => {
            if let Some(heir) = status.heir {
                log::warn!(
                    "[{}] Grace period over: heir {} can claim ownership",
                    label,
                    heir
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeartbeatSection, ServerSection, WalletSection};
    use crate::state::WalletState;
    use deadswitch_core::Address;
    use deadswitch_inherit::SuccessionController;
    use tempfile::tempdir;

    fn config(data_dir: &std::path::Path) -> ServerConfig {
        ServerConfig {
            server: ServerSection {
                data_dir: data_dir.to_path_buf(),
                ..ServerSection::default()
            },
            wallet: WalletSection {
                account: Address::from_bytes([0xEE; 20]),
                owner: Address::from_bytes([0x11; 20]),
                heartbeat_timeout_secs: 1_000,
                label: "test".into(),
            },
            heartbeat: HeartbeatSection::default(),
        }
    }

    #[tokio::test]
    async fn test_check_cycle_requires_state() {
        let dir = tempdir().unwrap();
        assert!(run_check_cycle(&config(dir.path())).await.is_err());
    }

    #[tokio::test]
    async fn test_check_cycle_reports_status() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let owner = config.wallet.owner;
        let heir = Address::from_bytes([0x22; 20]);

        // Owner last seen long ago, heir has proclaimed
        let mut controller =
            SuccessionController::with_timeout(config.wallet.account, owner, 1_000, 1).unwrap();
        controller.set_heir(&owner, heir, 1).unwrap();
        controller.proclaim_death(&heir, 2).unwrap();
        WalletState::new(controller)
            .save(&config.state_path())
            .unwrap();

        let status = run_check_cycle(&config).await.unwrap();
        assert_eq!(status.action, HeartbeatAction::Claimable);
        assert_eq!(status.heir, Some(heir));
    }

    #[tokio::test]
    async fn test_check_cycle_fresh_wallet_is_healthy() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let controller = SuccessionController::new(
            config.wallet.account,
            config.wallet.owner,
            SystemClock.now(),
        );
        WalletState::new(controller)
            .save(&config.state_path())
            .unwrap();

        let status = run_check_cycle(&config).await.unwrap();
        assert_eq!(status.action, HeartbeatAction::Healthy);
    }
}
