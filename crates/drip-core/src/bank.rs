//! The custodial pool.
//!
//! [`Bank`] holds the bulk of the supply under its own ledger account.
//! Any whitelisted caller may move its funds; everyone else is refused
//! before the ledger is touched.

use std::sync::Arc;

use tracing::debug;

use crate::error::LedgerError;
use crate::traits::{CapabilityRegistry, CustodialPool, LedgerOp, PoolOp, TokenLedger};
use crate::types::{Address, Capability};

pub struct Bank {
    address: Address,
    token: Arc<dyn TokenLedger>,
    capabilities: Arc<dyn CapabilityRegistry>,
}

impl Bank {
    pub fn new(address: Address, token: Arc<dyn TokenLedger>, capabilities: Arc<dyn CapabilityRegistry>) -> Self {
        Self { address, token, capabilities }
    }

    fn to_ledger_op(&self, op: &PoolOp) -> LedgerOp {
        let me = self.address;
        match *op {
            PoolOp::Mint { amount } => LedgerOp::Mint { minter: me, to: me, amount },
            PoolOp::Transfer { to, amount } => LedgerOp::Transfer { from: me, to, amount },
            PoolOp::TransferFrom { from, to, amount } => LedgerOp::TransferFrom { spender: me, from, to, amount },
            PoolOp::IncreaseAllowance { spender, amount } => LedgerOp::IncreaseAllowance { owner: me, spender, amount },
            PoolOp::DecreaseAllowance { spender, amount } => LedgerOp::DecreaseAllowance { owner: me, spender, amount },
        }
    }
}

impl CustodialPool for Bank {
    fn address(&self) -> Address {
        self.address
    }

    fn token(&self) -> Arc<dyn TokenLedger> {
        Arc::clone(&self.token)
    }

    fn execute(&self, caller: &Address, ops: &[PoolOp]) -> Result<(), LedgerError> {
        self.capabilities.require(Capability::Whitelisted, caller)?;
        let batch: Vec<LedgerOp> = ops.iter().map(|op| self.to_ledger_op(op)).collect();
        self.token.apply(&batch)?;
        debug!(%caller, ops = ops.len(), "pool batch executed");
        Ok(())
    }
}
