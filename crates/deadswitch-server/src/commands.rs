//! One-shot wallet commands run from the command line.

use crate::config::ServerConfig;
use crate::state::{StateError, WalletState};
use anyhow::{Context, Result};
use deadswitch_core::{Address, Amount, Clock, Ledger, MemoryLedger, SystemClock};
use deadswitch_inherit::{
    evaluate_heartbeat, SuccessionController, SuccessionError, SuccessionEvent, SuccessionPhase,
    Wallet,
};

/// A wallet command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the state file from the `[wallet]` config section
    Init,
    Status,
    History,
    Op(Operation),
}

/// A state-changing wallet operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Heartbeat,
    SetHeir(Address),
    RemoveHeir,
    SetTimeout(u64),
    ProclaimDeath,
    Claim,
    Receive { from: Address, amount: Amount },
    Send { to: Address, amount: Amount },
}

fn positional(args: &[String], i: usize, name: &str, what: &str) -> Result<String> {
    args.get(i)
        .cloned()
        .with_context(|| format!("{} requires {}", name, what))
}

fn parse_address(args: &[String], i: usize, name: &str, what: &str) -> Result<Address> {
    let raw = positional(args, i, name, what)?;
    raw.parse()
        .with_context(|| format!("Invalid {}: {}", what, raw))
}

fn parse_sats(args: &[String], i: usize, name: &str) -> Result<Amount> {
    let raw = positional(args, i, name, "an amount in satoshis")?;
    let sats: u64 = raw
        .parse()
        .with_context(|| format!("Invalid amount: {}", raw))?;
    Ok(Amount::from_sat(sats))
}

impl Command {
    /// Parse a command name and its positional arguments.
    pub fn parse(name: &str, args: &[String]) -> Result<Self> {
        let (command, expected_args) = match name {
            "init" => (Command::Init, 0),
            "status" => (Command::Status, 0),
            "history" => (Command::History, 0),
            "heartbeat" => (Command::Op(Operation::Heartbeat), 0),
            "set-heir" => (
                Command::Op(Operation::SetHeir(parse_address(
                    args,
                    0,
                    name,
                    "an heir address",
                )?)),
                1,
            ),
            "remove-heir" => (Command::Op(Operation::RemoveHeir), 0),
            "set-timeout" => {
                let raw = positional(args, 0, name, "a timeout in seconds")?;
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("Invalid timeout: {}", raw))?;
                (Command::Op(Operation::SetTimeout(secs)), 1)
            }
            "proclaim-death" => (Command::Op(Operation::ProclaimDeath), 0),
            "claim" => (Command::Op(Operation::Claim), 0),
            "receive" => (
                Command::Op(Operation::Receive {
                    from: parse_address(args, 0, name, "a sender address")?,
                    amount: parse_sats(args, 1, name)?,
                }),
                2,
            ),
            "send" => (
                Command::Op(Operation::Send {
                    to: parse_address(args, 0, name, "a recipient address")?,
                    amount: parse_sats(args, 1, name)?,
                }),
                2,
            ),
            other => anyhow::bail!("Unknown command: {}", other),
        };

        anyhow::ensure!(
            args.len() == expected_args,
            "{} takes {} argument(s), got {}",
            name,
            expected_args,
            args.len()
        );
        Ok(command)
    }

    /// Whether the command acts on behalf of a caller identity
    pub fn requires_caller(&self) -> bool {
        match self {
            Command::Op(op) => op.requires_caller(),
            _ => false,
        }
    }
}

impl Operation {
    /// Receiving funds is open to anyone; the sender is the caller.
    pub fn requires_caller(&self) -> bool {
        !matches!(self, Operation::Receive { .. })
    }

    fn run<C: Clock>(
        &self,
        wallet: &mut Wallet<MemoryLedger, C>,
        caller: &Address,
    ) -> Result<SuccessionEvent, SuccessionError> {
        match self {
            Operation::Heartbeat => wallet.heartbeat(caller),
            Operation::SetHeir(heir) => wallet.set_heir(caller, *heir),
            Operation::RemoveHeir => wallet.remove_heir(caller),
            Operation::SetTimeout(secs) => wallet.set_heartbeat_timeout(caller, *secs),
            Operation::ProclaimDeath => wallet.proclaim_death(caller),
            Operation::Claim => wallet.claim_heir_ownership(caller),
            Operation::Receive { amount, .. } => wallet.receive(caller, *amount),
            Operation::Send { to, amount } => wallet.send_to(caller, to, *amount),
        }
    }
}

/// Execute a command against the configured wallet's state file.
pub fn execute(config: &ServerConfig, command: &Command, caller: Option<Address>) -> Result<()> {
    let path = config.state_path();
    let clock = SystemClock;

    let op = match command {
        Command::Init => return init(config),
        Command::Status => {
            let state = load_state(config)?;
            print_status(config, &state, clock.now());
            return Ok(());
        }
        Command::History => {
            print_history(&load_state(config)?);
            return Ok(());
        }
        Command::Op(op) => op,
    };

    let caller = resolve_caller(op, caller)?;
    let event = WalletState::update(&path, &caller, clock, |wallet, caller| {
        op.run(wallet, caller)
    })
    .map_err(|e| state_error(&path, e))
    .with_context(|| format!("{:?} failed", op))?;

    println!("✅ {}", describe_event(&event));
    Ok(())
}

/// Identity an operation runs as. A receive is performed by its sender, so
/// an explicit caller must match it.
fn resolve_caller(op: &Operation, caller: Option<Address>) -> Result<Address> {
    match (op, caller) {
        (Operation::Receive { from, .. }, Some(caller)) if caller != *from => anyhow::bail!(
            "--caller {} conflicts with receive sender {}",
            caller,
            from
        ),
        (Operation::Receive { from, .. }, _) => Ok(*from),
        (_, Some(caller)) => Ok(caller),
        (_, None) => anyhow::bail!("This command requires --caller <ADDRESS>"),
    }
}

fn state_error(path: &std::path::Path, e: StateError) -> anyhow::Error {
    match e {
        StateError::NotInitialized(_) => {
            anyhow::anyhow!("No wallet state at {}; run `init` first", path.display())
        }
        other => other.into(),
    }
}

fn init(config: &ServerConfig) -> Result<()> {
    let path = config.state_path();
    let _lock = WalletState::lock(&path)
        .with_context(|| format!("Failed to lock {}", path.display()))?;
    if path.exists() {
        println!("Wallet already initialized at {}", path.display());
        return Ok(());
    }
    let controller = SuccessionController::with_timeout(
        config.wallet.account,
        config.wallet.owner,
        config.wallet.heartbeat_timeout_secs,
        SystemClock.now(),
    )?;
    WalletState::new(controller)
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!(
        "Initialized wallet '{}' at {}",
        config.wallet.label,
        path.display()
    );
    println!("✅ Wallet initialized: {}", path.display());
    Ok(())
}

/// Load the configured wallet's state, with a hint when it does not exist yet.
pub fn load_state(config: &ServerConfig) -> Result<WalletState> {
    let path = config.state_path();
    WalletState::load(&path)
        .map_err(|e| state_error(&path, e))
        .context("Failed to load wallet state")
}

/// One-line human description of an event
pub fn describe_event(event: &SuccessionEvent) -> String {
    match event {
        SuccessionEvent::Heartbeat { owner, .. } => format!("Heartbeat recorded for {}", owner),
        SuccessionEvent::HeirChanged { heir, .. } => format!("Heir set to {}", heir),
        SuccessionEvent::HeirRemoved { .. } => "Heir removed".to_string(),
        SuccessionEvent::TimeoutChanged { timeout, .. } => {
            format!("Heartbeat timeout set to {} seconds", timeout)
        }
        SuccessionEvent::DeathProclaimed {
            heir, claimable_at, ..
        } => format!(
            "Death proclaimed by {}; claimable at {}",
            heir,
            format_timestamp(*claimable_at)
        ),
        SuccessionEvent::OwnershipClaimed { new_owner, .. } => {
            format!("Ownership claimed by {}", new_owner)
        }
        SuccessionEvent::Sent { amount, to } => format!("Sent {} to {}", amount, to),
        SuccessionEvent::Received { amount, from } => format!("Received {} from {}", amount, from),
    }
}

fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn print_status(config: &ServerConfig, state: &WalletState, now: u64) {
    let controller = &state.controller;
    let status = evaluate_heartbeat(controller, now, &config.heartbeat_config());

    println!("Wallet:          {} ({})", config.wallet.label, controller.account());
    println!("Balance:         {}", state.ledger.balance_of(&controller.account()));
    println!("Owner:           {}", controller.owner());
    match controller.heir() {
        Some(heir) => println!("Heir:            {}", heir),
        None => println!("Heir:            (none)"),
    }
    println!("Timeout:         {} secs", controller.heartbeat_timeout());
    println!(
        "Last heartbeat:  {} ({} secs ago)",
        format_timestamp(controller.last_heartbeat()),
        status.secs_since_heartbeat
    );
    match controller.phase() {
        SuccessionPhase::Alive => println!("Phase:           alive"),
        SuccessionPhase::DeathProclaimed { claimable_at } => println!(
            "Phase:           death proclaimed, claimable at {}",
            format_timestamp(claimable_at)
        ),
    }
    println!("Status:          {:?}", status.action);

    let accounts: Vec<_> = state.ledger.accounts().collect();
    if !accounts.is_empty() {
        println!("Ledger:");
        for (address, balance) in accounts {
            println!("  {}  {}", address, balance);
        }
    }
}

fn print_history(state: &WalletState) {
    if state.history.is_empty() {
        println!("No events recorded.");
        return;
    }
    for record in &state.history {
        println!(
            "{}  {:<18} {}  {}",
            format_timestamp(record.at),
            record.event.kind(),
            record.caller,
            describe_event(&record.event)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    const ADDR: &str = "0x2222222222222222222222222222222222222222";

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("status", &[]).unwrap(), Command::Status);
        assert_eq!(
            Command::parse("heartbeat", &[]).unwrap(),
            Command::Op(Operation::Heartbeat)
        );
        assert_eq!(
            Command::parse("claim", &[]).unwrap(),
            Command::Op(Operation::Claim)
        );
        assert_eq!(
            Command::parse("proclaim-death", &[]).unwrap(),
            Command::Op(Operation::ProclaimDeath)
        );
    }

    #[test]
    fn test_parse_with_arguments() {
        assert_eq!(
            Command::parse("set-heir", &args(&[ADDR])).unwrap(),
            Command::Op(Operation::SetHeir(Address::from_bytes([0x22; 20])))
        );
        assert_eq!(
            Command::parse("set-timeout", &args(&["999"])).unwrap(),
            Command::Op(Operation::SetTimeout(999))
        );
        assert_eq!(
            Command::parse("send", &args(&[ADDR, "1500"])).unwrap(),
            Command::Op(Operation::Send {
                to: Address::from_bytes([0x22; 20]),
                amount: Amount::from_sat(1500)
            })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("set-heir", &[]).is_err());
        assert!(Command::parse("set-heir", &args(&["0x12"])).is_err());
        assert!(Command::parse("set-timeout", &args(&["soon"])).is_err());
        assert!(Command::parse("send", &args(&[ADDR])).is_err());
        assert!(Command::parse("status", &args(&["extra"])).is_err());
        assert!(Command::parse("explode", &[]).is_err());
    }

    #[test]
    fn test_requires_caller() {
        assert!(!Command::Status.requires_caller());
        assert!(!Command::Op(Operation::Receive {
            from: Address::ZERO,
            amount: Amount::ZERO
        })
        .requires_caller());
        assert!(Command::Op(Operation::Claim).requires_caller());
        assert!(Command::Op(Operation::SetTimeout(1)).requires_caller());
    }

    #[test]
    fn test_resolve_caller() {
        let sender = Address::from_bytes([0x22; 20]);
        let other = Address::from_bytes([0x33; 20]);
        let receive = Operation::Receive {
            from: sender,
            amount: Amount::from_sat(1),
        };

        assert_eq!(resolve_caller(&receive, None).unwrap(), sender);
        assert_eq!(resolve_caller(&receive, Some(sender)).unwrap(), sender);
        assert!(resolve_caller(&receive, Some(other)).is_err());

        assert_eq!(
            resolve_caller(&Operation::Heartbeat, Some(other)).unwrap(),
            other
        );
        assert!(resolve_caller(&Operation::Heartbeat, None).is_err());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_timestamp(u64::MAX), u64::MAX.to_string());
    }

    #[test]
    fn test_describe_event() {
        let heir = Address::from_bytes([0x22; 20]);
        assert_eq!(
            describe_event(&SuccessionEvent::HeirChanged {
                previous: None,
                heir
            }),
            format!("Heir set to {}", heir)
        );
    }
}
