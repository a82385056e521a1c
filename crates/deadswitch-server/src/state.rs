//! Persistent wallet state
//!
//! Controller, ledger and event history in one JSON file. Each command
//! loads it, applies a single operation and saves it back, holding an
//! exclusive lock on a sibling `.lock` file for the whole sequence.

use deadswitch_core::{Address, Clock, MemoryLedger};
use deadswitch_inherit::{SuccessionController, SuccessionError, SuccessionEvent, Wallet};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from state operations
#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt wallet state: {0}")]
    Invalid(SuccessionError),

    #[error("Wallet not initialized: {0}")]
    NotInitialized(String),

    #[error("Operation rejected: {0}")]
    Rejected(SuccessionError),
}

/// Exclusive lock on a wallet's state. Released on drop.
#[derive(Debug)]
pub struct StateLock {
    _file: File,
}

/// An event together with who triggered it and when
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordedEvent {
    /// Unix timestamp of the operation
    pub at: u64,
    pub caller: Address,
    pub event: SuccessionEvent,
}

/// Everything the server persists for one wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletState {
    pub controller: SuccessionController,
    pub ledger: MemoryLedger,
    #[serde(default)]
    pub history: Vec<RecordedEvent>,
}

impl WalletState {
    /// Fresh state for a newly deployed wallet
    pub fn new(controller: SuccessionController) -> Self {
        Self {
            controller,
            ledger: MemoryLedger::new(),
            history: Vec::new(),
        }
    }

    /// Path of the lock file guarding the state at `path`
    pub fn lock_path(path: &Path) -> PathBuf {
        path.with_extension("lock")
    }

    /// Block until this process holds the state lock for `path`.
    pub fn lock(path: &Path) -> Result<StateLock, StateError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(Self::lock_path(path))?;
        FileExt::lock_exclusive(&file)?;
        Ok(StateLock { _file: file })
    }

    /// Load the state at `path`, run one operation and save the result,
    /// all under the state lock. Nothing is written if the operation fails.
    pub fn update<C, F>(
        path: &Path,
        caller: &Address,
        clock: C,
        op: F,
    ) -> Result<SuccessionEvent, StateError>
    where
        C: Clock,
        F: FnOnce(&mut Wallet<MemoryLedger, C>, &Address) -> Result<SuccessionEvent, SuccessionError>,
    {
        let lock = Self::lock(path)?;
        let mut state = Self::load(path)?;
        let event = state
            .apply(caller, clock, op)
            .map_err(StateError::Rejected)?;
        state.save(path)?;
        drop(lock);
        Ok(event)
    }

    /// Load state from file. Fails if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, StateError> {
        if !path.exists() {
            return Err(StateError::NotInitialized(path.display().to_string()));
        }
        let contents = fs::read_to_string(path)?;
        let state: WalletState = serde_json::from_str(&contents)?;
        state.controller.validate().map_err(StateError::Invalid)?;
        Ok(state)
    }

    /// Save state to file
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        // Atomic replace
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Run one wallet operation against this state.
    ///
    /// The operation works on a copy; state and history change only if it
    /// succeeds.
    pub fn apply<C, F>(
        &mut self,
        caller: &Address,
        clock: C,
        op: F,
    ) -> Result<SuccessionEvent, SuccessionError>
    where
        C: Clock,
        F: FnOnce(&mut Wallet<MemoryLedger, C>, &Address) -> Result<SuccessionEvent, SuccessionError>,
    {
        let now = clock.now();
        let mut wallet = Wallet::from_parts(self.controller.clone(), self.ledger.clone(), clock);
        let event = op(&mut wallet, caller)?;

        let (controller, ledger, _) = wallet.into_parts();
        self.controller = controller;
        self.ledger = ledger;
        self.history.push(RecordedEvent {
            at: now,
            caller: *caller,
            event: event.clone(),
        });
        Ok(event)
    }
}
