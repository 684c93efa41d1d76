//! Consumed-nonce tracking for signed authorizations.
//!
//! A [`ReplayGuard`] is a plain set, not a counter: nonces may arrive in any
//! order because the off-chain signer issues approvals independently.
//! Each module owns its own guard, so the same nonce value may be used
//! once per module.

use std::collections::HashSet;

use primitive_types::U256;

use crate::error::AuthError;

#[derive(Debug, Clone, Default)]
pub struct ReplayGuard {
    consumed: HashSet<U256>,
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_consumed(&self, nonce: &U256) -> bool {
        self.consumed.contains(nonce)
    }

    /// Fail with [`AuthError::Replayed`] if `nonce` was already consumed.
    pub fn ensure_fresh(&self, nonce: &U256) -> Result<(), AuthError> {
        if self.is_consumed(nonce) {
            return Err(AuthError::Replayed { nonce: *nonce });
        }
        Ok(())
    }

    /// Mark `nonce` consumed. Fails if it already was.
    pub fn consume(&mut self, nonce: U256) -> Result<(), AuthError> {
        if !self.consumed.insert(nonce) {
            return Err(AuthError::Replayed { nonce });
        }
        Ok(())
    }

    /// Number of consumed nonces.
    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }
}
