//! deadswitch server: host for a dead man's switch wallet
//!
//! Keeps the wallet state on disk, applies owner/heir operations from the
//! command line, and runs a monitoring daemon that warns when the owner
//! goes quiet.
//!
//! # Usage
//!
//! ```bash
//! deadswitch-server --config deadswitch.toml init
//! deadswitch-server --config deadswitch.toml --caller 0x… set-heir 0x…
//! deadswitch-server --config deadswitch.toml          # run daemon
//! deadswitch-server --check                           # one check cycle
//! ```

mod commands;
mod config;
mod daemon;
mod state;

use anyhow::{Context, Result};
use commands::Command;
use deadswitch_core::Address;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Parse CLI args (minimal, no clap)
    let args: Vec<String> = std::env::args().collect();

    let mut config_path = PathBuf::from("/config/deadswitch.toml");
    let mut caller: Option<Address> = std::env::var("DEADSWITCH_CALLER")
        .ok()
        .map(|v| v.parse())
        .transpose()
        .context("Invalid DEADSWITCH_CALLER")?;
    let mut one_shot = false;
    let mut validate_only = false;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_path = PathBuf::from(&args[i]);
                } else {
                    anyhow::bail!("--config requires a path argument");
                }
            }
            "--caller" => {
                i += 1;
                let raw = args
                    .get(i)
                    .context("--caller requires an address argument")?;
                caller = Some(
                    raw.parse()
                        .with_context(|| format!("Invalid --caller address: {}", raw))?,
                );
            }
            "--check" | "--once" => {
                one_shot = true;
            }
            "--validate" => {
                validate_only = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--version" | "-V" => {
                println!("deadswitch-server {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            flag if flag.starts_with('-') => {
                anyhow::bail!("Unknown argument: {}", flag);
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    // Load config
    let mut server_config = config::ServerConfig::from_file(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Apply env overrides
    server_config.apply_env_overrides()?;

    // Validate
    server_config
        .validate()
        .context("Configuration validation failed")?;

    // Init logger; RUST_LOG still wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&server_config.server.log_level),
    )
    .init();

    if validate_only {
        println!("✅ Configuration is valid.");
        println!("  Wallet:         {}", server_config.wallet.label);
        println!("  Account:        {}", server_config.wallet.account);
        println!("  Owner:          {}", server_config.wallet.owner);
        println!(
            "  Timeout:        {} secs",
            server_config.wallet.heartbeat_timeout_secs
        );
        println!(
            "  Check interval: {} secs",
            server_config.server.check_interval_secs
        );
        println!("  State file:     {}", server_config.state_path().display());
        return Ok(());
    }

    if let Some((name, rest)) = positional.split_first() {
        let command = Command::parse(name, rest)?;
        if command.requires_caller() && caller.is_none() {
            anyhow::bail!("`{}` requires --caller <ADDRESS>", name);
        }
        return commands::execute(&server_config, &command, caller);
    }

    // Build tokio runtime
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

    if one_shot {
        log::info!("Running single check cycle…");
        rt.block_on(daemon::run_check_cycle(&server_config))?;
        log::info!("Done.");
    } else {
        // Install Ctrl-C handler for graceful shutdown
        let shutdown = rt.block_on(async {
            tokio::select! {
                result = daemon::run(server_config) => result,
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Received shutdown signal. Exiting…");
                    Ok(())
                }
            }
        });

        if let Err(e) = shutdown {
            log::error!("Server error: {:#}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"deadswitch server: dead man's switch wallet host

USAGE:
    deadswitch-server [OPTIONS] [COMMAND [ARGS]]

OPTIONS:
    -c, --config <PATH>   Config file path (default: /config/deadswitch.toml)
    --caller <ADDRESS>    Identity performing the command
    --check, --once       Run a single check cycle and exit
    --validate            Validate config file and exit
    -h, --help            Show this help message
    -V, --version         Show version

COMMANDS:
    init                      Create the wallet state from the config
    status                    Show owner, heir, timers and balance
    history                   Show recorded events
    heartbeat                 Owner: prove presence
    set-heir <ADDRESS>        Owner: designate the heir
    remove-heir               Owner: clear the heir, cancel succession
    set-timeout <SECS>        Owner: change the heartbeat timeout
    send <ADDRESS> <SATS>     Owner: send funds from the wallet
    proclaim-death            Heir: declare the owner absent
    claim                     Heir: take ownership after the grace period
    receive <FROM> <SATS>     Anyone: deposit funds into the wallet
                              (runs as FROM; a different --caller is rejected)

    With no command, runs the monitoring daemon.

ENVIRONMENT VARIABLES (override config file):
    DEADSWITCH_DATA_DIR            Data directory path
    DEADSWITCH_CHECK_INTERVAL      Check interval in seconds
    DEADSWITCH_LOG_LEVEL           Log level (error/warn/info/debug/trace)
    DEADSWITCH_ACCOUNT             Wallet ledger account
    DEADSWITCH_OWNER               Initial owner
    DEADSWITCH_HEARTBEAT_TIMEOUT   Initial heartbeat timeout in seconds
    DEADSWITCH_CALLER              Default --caller

EXAMPLES:
    # Deploy and designate an heir
    deadswitch-server -c config.toml init
    deadswitch-server -c config.toml --caller 0xOWNER set-heir 0xHEIR

    # Single check (useful for cron jobs)
    deadswitch-server -c config.toml --check
"#
    );
}
