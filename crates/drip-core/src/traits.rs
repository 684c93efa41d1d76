//! Trait interfaces for the Drip protocol.
//!
//! These traits define the seams between the core and its collaborators:
//! - [`TokenLedger`] — fungible balances and the mint primitive (drip-core `MemoryLedger`)
//! - [`CapabilityRegistry`] — role lookups (drip-core `MemoryCapabilities`)
//! - [`CustodialPool`] — the whitelisted-only treasury (drip-core `Bank`)
//! - [`SignatureRecovery`] — digest + signer recovery (drip-core `PersonalSign`)
//! - [`EmissionCurve`] — tokens owed over a time span (drip-emission)

use std::sync::Arc;

use primitive_types::U256;

use crate::error::{EmissionError, LedgerError};
use crate::types::{Address, Capability, Hash256, Timestamp};

/// One mutation of the token ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerOp {
    /// Create `amount` new tokens for `to`. `minter` must hold [`Capability::Minter`].
    Mint { minter: Address, to: Address, amount: U256 },
    Transfer { from: Address, to: Address, amount: U256 },
    /// Move tokens on behalf of `from`, spending `spender`'s allowance.
    TransferFrom { spender: Address, from: Address, to: Address, amount: U256 },
    IncreaseAllowance { owner: Address, spender: Address, amount: U256 },
    DecreaseAllowance { owner: Address, spender: Address, amount: U256 },
}

/// Fungible token balances.
///
/// Every mutation goes through [`apply`](Self::apply), which is
/// all-or-nothing: either every op in the batch takes effect or none does.
pub trait TokenLedger: Send + Sync {
    fn balance_of(&self, account: &Address) -> U256;

    fn allowance(&self, owner: &Address, spender: &Address) -> U256;

    fn total_supply(&self) -> U256;

    /// Apply a batch of mutations atomically.
    fn apply(&self, ops: &[LedgerOp]) -> Result<(), LedgerError>;

    fn transfer(&self, from: &Address, to: &Address, amount: U256) -> Result<(), LedgerError> {
        self.apply(&[LedgerOp::Transfer { from: *from, to: *to, amount }])
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        self.apply(&[LedgerOp::TransferFrom { spender: *spender, from: *from, to: *to, amount }])
    }

    fn increase_allowance(&self, owner: &Address, spender: &Address, amount: U256) -> Result<(), LedgerError> {
        self.apply(&[LedgerOp::IncreaseAllowance { owner: *owner, spender: *spender, amount }])
    }

    fn decrease_allowance(&self, owner: &Address, spender: &Address, amount: U256) -> Result<(), LedgerError> {
        self.apply(&[LedgerOp::DecreaseAllowance { owner: *owner, spender: *spender, amount }])
    }

    fn mint(&self, minter: &Address, to: &Address, amount: U256) -> Result<(), LedgerError> {
        self.apply(&[LedgerOp::Mint { minter: *minter, to: *to, amount }])
    }
}

/// Read side of the role registry. Components only ever ask "does this
/// account hold this capability"; management lives on the implementation.
pub trait CapabilityRegistry: Send + Sync {
    fn has(&self, capability: Capability, account: &Address) -> bool;

    /// Fail with [`LedgerError::MissingCapability`] unless `account` holds `capability`.
    fn require(&self, capability: Capability, account: &Address) -> Result<(), LedgerError> {
        if self.has(capability, account) {
            Ok(())
        } else {
            Err(LedgerError::MissingCapability { capability, account: *account })
        }
    }
}

/// One movement of pool funds, performed with the pool as the acting account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolOp {
    /// Mint `amount` new tokens into the pool.
    Mint { amount: U256 },
    Transfer { to: Address, amount: U256 },
    TransferFrom { from: Address, to: Address, amount: U256 },
    IncreaseAllowance { spender: Address, amount: U256 },
    DecreaseAllowance { spender: Address, amount: U256 },
}

/// The account holding the bulk of the supply.
///
/// Only callers holding [`Capability::Whitelisted`] may move its funds.
/// A batch passed to [`execute`](Self::execute) is all-or-nothing.
pub trait CustodialPool: Send + Sync {
    /// The pool's own account on the ledger.
    fn address(&self) -> Address;

    /// The ledger the pool keeps its balance on.
    fn token(&self) -> Arc<dyn TokenLedger>;

    fn execute(&self, caller: &Address, ops: &[PoolOp]) -> Result<(), LedgerError>;

    fn balance(&self) -> U256 {
        self.token().balance_of(&self.address())
    }

    fn transfer(&self, caller: &Address, to: &Address, amount: U256) -> Result<(), LedgerError> {
        self.execute(caller, &[PoolOp::Transfer { to: *to, amount }])
    }

    fn transfer_from(&self, caller: &Address, from: &Address, to: &Address, amount: U256) -> Result<(), LedgerError> {
        self.execute(caller, &[PoolOp::TransferFrom { from: *from, to: *to, amount }])
    }

    fn increase_allowance(&self, caller: &Address, spender: &Address, amount: U256) -> Result<(), LedgerError> {
        self.execute(caller, &[PoolOp::IncreaseAllowance { spender: *spender, amount }])
    }

    fn decrease_allowance(&self, caller: &Address, spender: &Address, amount: U256) -> Result<(), LedgerError> {
        self.execute(caller, &[PoolOp::DecreaseAllowance { spender: *spender, amount }])
    }

    fn mint(&self, caller: &Address, amount: U256) -> Result<(), LedgerError> {
        self.execute(caller, &[PoolOp::Mint { amount }])
    }
}

/// Message digest and signer recovery, isolated from authorization logic.
///
/// Implementations must fail closed: any malformed or non-canonical
/// signature yields `None`, never a panic.
pub trait SignatureRecovery: Send + Sync {
    /// Digest that the off-chain signer actually signs for `message`.
    fn signing_digest(&self, message: &[u8]) -> Hash256;

    /// Recover the signing address from a digest and a signature.
    fn recover(&self, digest: &Hash256, signature: &[u8]) -> Option<Address>;

    /// Recover the signer of `message`.
    ///
    /// Default implementation: [`recover`](Self::recover) over [`signing_digest`](Self::signing_digest).
    fn recover_signer(&self, message: &[u8], signature: &[u8]) -> Option<Address> {
        self.recover(&self.signing_digest(message), signature)
    }
}

/// Tokens owed for a span of time.
pub trait EmissionCurve: Send + Sync {
    /// Total emission for `[from, to)`. Zero when `to <= from`.
    fn emitted_between(&self, from: Timestamp, to: Timestamp) -> Result<U256, EmissionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};

    // ------------------------------------------------------------------
    // Mock: TokenLedger (no atomicity, only for default-method routing)
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct RecordingLedger {
        applied: Mutex<Vec<LedgerOp>>,
    }

    impl TokenLedger for RecordingLedger {
        fn balance_of(&self, _account: &Address) -> U256 {
            U256::zero()
        }

        fn allowance(&self, _owner: &Address, _spender: &Address) -> U256 {
            U256::zero()
        }

        fn total_supply(&self) -> U256 {
            U256::zero()
        }

        fn apply(&self, ops: &[LedgerOp]) -> Result<(), LedgerError> {
            self.applied.lock().extend_from_slice(ops);
            Ok(())
        }
    }

    struct StubRegistry(HashMap<Capability, HashSet<Address>>);

    impl CapabilityRegistry for StubRegistry {
        fn has(&self, capability: Capability, account: &Address) -> bool {
            self.0.get(&capability).is_some_and(|set| set.contains(account))
        }
    }

    struct ConstantCurve(U256);

    impl EmissionCurve for ConstantCurve {
        fn emitted_between(&self, from: Timestamp, to: Timestamp) -> Result<U256, EmissionError> {
            let secs = to.saturating_sub(from);
            self.0.checked_mul(U256::from(secs)).ok_or(EmissionError::ArithmeticOverflow)
        }
    }

    fn addr(seed: u8) -> Address {
        Address([seed; 20])
    }

    #[test]
    fn ledger_defaults_route_through_apply() {
        let ledger = RecordingLedger::default();
        ledger.transfer(&addr(1), &addr(2), U256::from(5)).unwrap();
        ledger.mint(&addr(9), &addr(2), U256::from(7)).unwrap();
        let applied = ledger.applied.lock();
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0], LedgerOp::Transfer { from: addr(1), to: addr(2), amount: U256::from(5) });
        assert_eq!(applied[1], LedgerOp::Mint { minter: addr(9), to: addr(2), amount: U256::from(7) });
    }

    #[test]
    fn registry_require_reports_missing_capability() {
        let mut roles = HashMap::new();
        roles.insert(Capability::Minter, HashSet::from([addr(1)]));
        let registry = StubRegistry(roles);

        assert!(registry.require(Capability::Minter, &addr(1)).is_ok());
        assert_eq!(
            registry.require(Capability::Whitelisted, &addr(1)),
            Err(LedgerError::MissingCapability { capability: Capability::Whitelisted, account: addr(1) })
        );
    }

    #[test]
    fn curve_is_zero_for_empty_span() {
        let curve = ConstantCurve(U256::from(10));
        assert_eq!(curve.emitted_between(5, 5).unwrap(), U256::zero());
        assert_eq!(curve.emitted_between(6, 5).unwrap(), U256::zero());
        assert_eq!(curve.emitted_between(5, 8).unwrap(), U256::from(30));
    }
}
