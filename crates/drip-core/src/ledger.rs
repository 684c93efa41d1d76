//! In-memory token ledger.
//!
//! [`MemoryLedger`] keeps balances, allowances and total supply in
//! `HashMap`s behind a single lock. A batch passed to
//! [`TokenLedger::apply`] writes into a [`Staged`] overlay holding only the
//! entries it touches; the overlay is merged back once every op succeeds,
//! so a failed batch leaves no trace.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use primitive_types::U256;

use crate::error::LedgerError;
use crate::traits::{CapabilityRegistry, LedgerOp, TokenLedger};
use crate::types::{Address, Capability};

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Address, U256>,
    /// (owner, spender) → remaining allowance.
    allowances: HashMap<(Address, Address), U256>,
    total_supply: U256,
}

impl LedgerState {
    fn balance(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or_default()
    }

    fn commit(&mut self, writes: Writes) {
        self.balances.extend(writes.balances);
        self.allowances.extend(writes.allowances);
        self.total_supply = writes.total_supply;
    }
}

/// Entries written by one batch.
#[derive(Debug)]
struct Writes {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    total_supply: U256,
}

/// Pending writes of one batch over the committed state.
struct Staged<'a> {
    base: &'a LedgerState,
    writes: Writes,
}

impl<'a> Staged<'a> {
    fn new(base: &'a LedgerState) -> Self {
        Self {
            base,
            writes: Writes {
                balances: HashMap::new(),
                allowances: HashMap::new(),
                total_supply: base.total_supply,
            },
        }
    }

    fn balance(&self, account: &Address) -> U256 {
        match self.writes.balances.get(account) {
            Some(staged) => *staged,
            None => self.base.balance(account),
        }
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        match self.writes.allowances.get(&(*owner, *spender)) {
            Some(staged) => *staged,
            None => self.base.allowance(owner, spender),
        }
    }

    fn set_allowance(&mut self, owner: &Address, spender: &Address, amount: U256) {
        self.writes.allowances.insert((*owner, *spender), amount);
    }

    fn debit(&mut self, account: &Address, amount: U256) -> Result<(), LedgerError> {
        let have = self.balance(account);
        let left = have.checked_sub(amount).ok_or(LedgerError::InsufficientBalance {
            account: *account,
            have,
            need: amount,
        })?;
        self.writes.balances.insert(*account, left);
        Ok(())
    }

    fn credit(&mut self, account: &Address, amount: U256) -> Result<(), LedgerError> {
        let total = self.balance(account).checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.writes.balances.insert(*account, total);
        Ok(())
    }

    fn step(&mut self, op: &LedgerOp, capabilities: &dyn CapabilityRegistry) -> Result<(), LedgerError> {
        match op {
            LedgerOp::Mint { minter, to, amount } => {
                capabilities.require(Capability::Minter, minter)?;
                self.writes.total_supply = self.writes.total_supply.checked_add(*amount).ok_or(LedgerError::Overflow)?;
                self.credit(to, *amount)
            }
            LedgerOp::Transfer { from, to, amount } => {
                self.debit(from, *amount)?;
                self.credit(to, *amount)
            }
            LedgerOp::TransferFrom { spender, from, to, amount } => {
                let have = self.allowance(from, spender);
                let left = have.checked_sub(*amount).ok_or(LedgerError::InsufficientAllowance {
                    owner: *from,
                    spender: *spender,
                    have,
                    need: *amount,
                })?;
                self.set_allowance(from, spender, left);
                self.debit(from, *amount)?;
                self.credit(to, *amount)
            }
            LedgerOp::IncreaseAllowance { owner, spender, amount } => {
                let next = self.allowance(owner, spender).checked_add(*amount).ok_or(LedgerError::Overflow)?;
                self.set_allowance(owner, spender, next);
                Ok(())
            }
            LedgerOp::DecreaseAllowance { owner, spender, amount } => {
                let have = self.allowance(owner, spender);
                let next = have.checked_sub(*amount).ok_or(LedgerError::InsufficientAllowance {
                    owner: *owner,
                    spender: *spender,
                    have,
                    need: *amount,
                })?;
                self.set_allowance(owner, spender, next);
                Ok(())
            }
        }
    }

    fn into_writes(self) -> Writes {
        self.writes
    }
}

/// Token ledger backed by process memory. No persistence.
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
    capabilities: Arc<dyn CapabilityRegistry>,
}

impl MemoryLedger {
    /// Create an empty ledger. Minting is gated by `capabilities`.
    pub fn new(capabilities: Arc<dyn CapabilityRegistry>) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            capabilities,
        }
    }

    /// Create a ledger whose whole initial supply belongs to `beneficiary`.
    pub fn with_genesis(capabilities: Arc<dyn CapabilityRegistry>, beneficiary: &Address, supply: U256) -> Self {
        let mut state = LedgerState::default();
        state.balances.insert(*beneficiary, supply);
        state.total_supply = supply;
        Self {
            state: Mutex::new(state),
            capabilities,
        }
    }

    /// Number of accounts that have ever held a balance entry.
    pub fn account_count(&self) -> usize {
        self.state.lock().balances.len()
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&self, account: &Address) -> U256 {
        self.state.lock().balance(account)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.state.lock().allowance(owner, spender)
    }

    fn total_supply(&self) -> U256 {
        self.state.lock().total_supply
    }

    fn apply(&self, ops: &[LedgerOp]) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        let writes = {
            let mut staged = Staged::new(&state);
            for op in ops {
                staged.step(op, self.capabilities.as_ref())?;
            }
            staged.into_writes()
        };
        state.commit(writes);
        Ok(())
    }
}
