//! Withdrawal gate: one-shot pulls from the pool.
//!
//! Each signed operation moves `quantity` tokens from the pool straight to
//! its beneficiary, once. The gate keeps no balance of its own.

use std::sync::Arc;

use drip_core::error::{AuthError, DripError};
use drip_core::traits::CustodialPool;
use drip_core::types::{Address, AuthorizedOperation, MessageLayout, Timestamp};
use primitive_types::U256;
use tracing::info;

use crate::authorizer::Authorizer;

pub struct WithdrawalGate {
    address: Address,
    pool: Arc<dyn CustodialPool>,
    auth: Authorizer,
}

impl WithdrawalGate {
    pub fn new(address: Address, pool: Arc<dyn CustodialPool>, trusted_signer: Address) -> Self {
        Self::with_authorizer(address, pool, Authorizer::new(trusted_signer, MessageLayout::ExpiryOnly))
    }

    pub fn with_authorizer(address: Address, pool: Arc<dyn CustodialPool>, auth: Authorizer) -> Self {
        Self { address, pool, auth }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn trusted_signer(&self) -> Address {
        self.auth.trusted_signer()
    }

    /// Whether the operation with `nonce` has already been pulled.
    pub fn is_pulled(&self, nonce: &U256) -> bool {
        self.auth.is_consumed(nonce)
    }

    pub fn is_valid_operation(&self, op: &AuthorizedOperation, now: Timestamp) -> bool {
        self.auth.is_valid_operation(op, now)
    }

    /// Move `op.quantity` tokens from the pool to `op.beneficiary`.
    ///
    /// A reused nonce fails with [`AuthError::AlreadyPulled`].
    pub fn pull(&mut self, op: &AuthorizedOperation, now: Timestamp) -> Result<U256, DripError> {
        let pool = &self.pool;
        let me = self.address;
        self.auth
            .execute(op, now, || -> Result<(), DripError> {
                pool.transfer(&me, &op.beneficiary, op.quantity)?;
                Ok(())
            })
            .map_err(|e| match e {
                DripError::Auth(AuthError::Replayed { nonce }) => AuthError::AlreadyPulled { nonce }.into(),
                other => other,
            })?;
        info!(beneficiary = %op.beneficiary, amount = %op.quantity, nonce = %op.nonce, "tokens pulled");
        Ok(op.quantity)
    }
}
