//! Dead man's switch wallet: a [`SuccessionController`] bound to its ledger
//! and clock collaborators.
//!
//! The wallet reads the clock once per call and hands the time to the
//! controller. `&mut self` on every mutating call is what serializes
//! operations; a host that shares a wallet wraps it in a lock.

use crate::events::SuccessionEvent;
use crate::heartbeat::{evaluate_heartbeat, HeartbeatConfig, HeartbeatStatus};
use crate::succession::{SuccessionController, SuccessionError, SuccessionPhase};
use deadswitch_core::{Address, Amount, Clock, Ledger};

pub struct Wallet<L: Ledger, C: Clock> {
    controller: SuccessionController,
    ledger: L,
    clock: C,
}

impl<L: Ledger, C: Clock> Wallet<L, C> {
    /// Deploy a new wallet owned by `owner`, holding funds in `account`.
    pub fn new(account: Address, owner: Address, ledger: L, clock: C) -> Self {
        let controller = SuccessionController::new(account, owner, clock.now());
        log::info!("Wallet {} created for owner {}", account, owner);
        Self {
            controller,
            ledger,
            clock,
        }
    }

    /// Rebuild a wallet from previously persisted parts.
    pub fn from_parts(controller: SuccessionController, ledger: L, clock: C) -> Self {
        Self {
            controller,
            ledger,
            clock,
        }
    }

    pub fn into_parts(self) -> (SuccessionController, L, C) {
        (self.controller, self.ledger, self.clock)
    }

    pub fn controller(&self) -> &SuccessionController {
        &self.controller
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn account(&self) -> Address {
        self.controller.account()
    }

    pub fn owner(&self) -> Address {
        self.controller.owner()
    }

    pub fn heir(&self) -> Option<Address> {
        self.controller.heir()
    }

    pub fn heartbeat_timeout(&self) -> u64 {
        self.controller.heartbeat_timeout()
    }

    pub fn time_of_death(&self) -> u64 {
        self.controller.time_of_death()
    }

    pub fn phase(&self) -> SuccessionPhase {
        self.controller.phase()
    }

    /// Funds held by the wallet account
    pub fn balance(&self) -> Amount {
        self.ledger.balance_of(&self.controller.account())
    }

    /// Heartbeat evaluation at the current time
    pub fn status(&self, config: &HeartbeatConfig) -> HeartbeatStatus {
        evaluate_heartbeat(&self.controller, self.clock.now(), config)
    }

    pub fn heartbeat(&mut self, caller: &Address) -> Result<SuccessionEvent, SuccessionError> {
        let now = self.clock.now();
        self.controller.heartbeat(caller, now)
    }

    pub fn set_heir(
        &mut self,
        caller: &Address,
        heir: Address,
    ) -> Result<SuccessionEvent, SuccessionError> {
        let now = self.clock.now();
        self.controller.set_heir(caller, heir, now)
    }

    pub fn remove_heir(&mut self, caller: &Address) -> Result<SuccessionEvent, SuccessionError> {
        let now = self.clock.now();
        self.controller.remove_heir(caller, now)
    }

    pub fn set_heartbeat_timeout(
        &mut self,
        caller: &Address,
        timeout: u64,
    ) -> Result<SuccessionEvent, SuccessionError> {
        let now = self.clock.now();
        self.controller.set_heartbeat_timeout(caller, timeout, now)
    }

    pub fn proclaim_death(&mut self, caller: &Address) -> Result<SuccessionEvent, SuccessionError> {
        let now = self.clock.now();
        self.controller.proclaim_death(caller, now)
    }

    pub fn claim_heir_ownership(
        &mut self,
        caller: &Address,
    ) -> Result<SuccessionEvent, SuccessionError> {
        let now = self.clock.now();
        self.controller.claim_heir_ownership(caller, now)
    }

    pub fn send_to(
        &mut self,
        caller: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<SuccessionEvent, SuccessionError> {
        let now = self.clock.now();
        self.controller
            .send_to(caller, recipient, amount, now, &mut self.ledger)
    }

    /// Accept funds from `from`. Open to anyone.
    pub fn receive(
        &mut self,
        from: &Address,
        amount: Amount,
    ) -> Result<SuccessionEvent, SuccessionError> {
        self.controller.receive(from, amount, &mut self.ledger)
    }
}
