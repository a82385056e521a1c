//! Account balance ledger
//!
//! The wallet holds its funds in a ledger account of its own. The ledger is
//! the only place balances live; the succession controller just decides who
//! may move them.

use crate::address::Address;
use bitcoin::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient funds in {address}: available {available}, requested {requested}")]
    InsufficientFunds {
        address: Address,
        available: Amount,
        requested: Amount,
    },

    #[error("Balance overflow for {0}")]
    Overflow(Address),
}

/// External account-balance ledger.
pub trait Ledger {
    /// Current balance of an account (zero if unknown)
    fn balance_of(&self, address: &Address) -> Amount;

    /// Move `amount` from one account to another.
    ///
    /// Either both balances change or neither does.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount)
        -> Result<(), LedgerError>;

    /// Add incoming funds to an account
    fn credit(&mut self, address: &Address, amount: Amount) -> Result<(), LedgerError>;
}

/// In-memory ledger, serializable so a host can persist it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryLedger {
    balances: BTreeMap<Address, Amount>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of every account balance
    pub fn total(&self) -> Amount {
        self.balances
            .values()
            .fold(Amount::ZERO, |acc, b| acc.checked_add(*b).unwrap_or(Amount::MAX))
    }

    /// Accounts with a nonzero balance
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter().filter(|(_, b)| **b > Amount::ZERO)
    }
}

impl Ledger for MemoryLedger {
    fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(Amount::ZERO)
    }

    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.balance_of(from);
        let debited = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                address: *from,
                available,
                requested: amount,
            })?;

        if from == to {
            return Ok(());
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(*to))?;

        self.balances.insert(*from, debited);
        self.balances.insert(*to, credited);
        log::debug!("Ledger transfer {} -> {}: {}", from, to, amount);
        Ok(())
    }

    fn credit(&mut self, address: &Address, amount: Amount) -> Result<(), LedgerError> {
        let credited = self
            .balance_of(address)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(*address))?;
        self.balances.insert(*address, credited);
        log::debug!("Ledger credit {}: {}", address, amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    #[test]
    fn test_credit_increases_balance() {
        let mut ledger = MemoryLedger::new();
        assert_eq!(ledger.balance_of(&addr(1)), Amount::ZERO);

        ledger.credit(&addr(1), Amount::from_sat(1000)).unwrap();
        ledger.credit(&addr(1), Amount::from_sat(500)).unwrap();

        assert_eq!(ledger.balance_of(&addr(1)), Amount::from_sat(1500));
    }

    #[test]
    fn test_transfer_conserves_total() {
        let mut ledger = MemoryLedger::new();
        ledger.credit(&addr(1), Amount::from_sat(1000)).unwrap();
        let before = ledger.total();

        ledger
            .transfer(&addr(1), &addr(2), Amount::from_sat(400))
            .unwrap();

        assert_eq!(ledger.balance_of(&addr(1)), Amount::from_sat(600));
        assert_eq!(ledger.balance_of(&addr(2)), Amount::from_sat(400));
        assert_eq!(ledger.total(), before);
    }

    #[test]
    fn test_transfer_insufficient_funds_leaves_balances() {
        let mut ledger = MemoryLedger::new();
        ledger.credit(&addr(1), Amount::from_sat(100)).unwrap();

        let err = ledger
            .transfer(&addr(1), &addr(2), Amount::from_sat(101))
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                address: addr(1),
                available: Amount::from_sat(100),
                requested: Amount::from_sat(101),
            }
        );
        assert_eq!(ledger.balance_of(&addr(1)), Amount::from_sat(100));
        assert_eq!(ledger.balance_of(&addr(2)), Amount::ZERO);
    }

    #[test]
    fn test_self_transfer_is_noop() {
        let mut ledger = MemoryLedger::new();
        ledger.credit(&addr(1), Amount::from_sat(100)).unwrap();
        ledger
            .transfer(&addr(1), &addr(1), Amount::from_sat(100))
            .unwrap();
        assert_eq!(ledger.balance_of(&addr(1)), Amount::from_sat(100));
    }

    #[test]
    fn test_accounts_skips_emptied_balances() {
        let mut ledger = MemoryLedger::new();
        ledger.credit(&addr(1), Amount::from_sat(100)).unwrap();
        ledger
            .transfer(&addr(1), &addr(2), Amount::from_sat(100))
            .unwrap();

        let accounts: Vec<_> = ledger.accounts().collect();
        assert_eq!(accounts, vec![(&addr(2), &Amount::from_sat(100))]);
    }

    #[test]
    fn test_credit_overflow() {
        let mut ledger = MemoryLedger::new();
        ledger.credit(&addr(1), Amount::MAX).unwrap();
        assert_eq!(
            ledger.credit(&addr(1), Amount::from_sat(1)),
            Err(LedgerError::Overflow(addr(1)))
        );
        assert_eq!(ledger.balance_of(&addr(1)), Amount::MAX);
    }

    #[test]
    fn test_ledger_serde_roundtrip() {
        let mut ledger = MemoryLedger::new();
        ledger.credit(&addr(1), Amount::from_sat(42)).unwrap();

        let json = serde_json::to_string(&ledger).unwrap();
        let restored: MemoryLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, ledger);
    }
}
