//! Shared authorization check for signed operations.
//!
//! An [`Authorizer`] accepts an [`AuthorizedOperation`] when, in order:
//! 1. its signature recovers to the trusted signer,
//! 2. `now` lies inside its time window (both ends inclusive),
//! 3. its nonce has not been consumed by this authorizer.
//!
//! [`execute`](Authorizer::execute) runs a caller-supplied effect after the
//! check and consumes the nonce only if the effect succeeds.

use std::sync::Arc;

use drip_core::crypto::PersonalSign;
use drip_core::error::AuthError;
use drip_core::replay::ReplayGuard;
use drip_core::traits::SignatureRecovery;
use drip_core::types::{Address, AuthorizedOperation, MessageLayout, Timestamp};
use primitive_types::U256;
use tracing::{debug, warn};

pub struct Authorizer {
    trusted_signer: Address,
    layout: MessageLayout,
    scheme: Arc<dyn SignatureRecovery>,
    nonces: ReplayGuard,
}

impl Authorizer {
    /// Authorizer using the personal-message signing scheme.
    pub fn new(trusted_signer: Address, layout: MessageLayout) -> Self {
        Self::with_scheme(trusted_signer, layout, Arc::new(PersonalSign))
    }

    pub fn with_scheme(trusted_signer: Address, layout: MessageLayout, scheme: Arc<dyn SignatureRecovery>) -> Self {
        Self {
            trusted_signer,
            layout,
            scheme,
            nonces: ReplayGuard::new(),
        }
    }

    pub fn trusted_signer(&self) -> Address {
        self.trusted_signer
    }

    pub fn layout(&self) -> MessageLayout {
        self.layout
    }

    pub fn is_consumed(&self, nonce: &U256) -> bool {
        self.nonces.is_consumed(nonce)
    }

    fn verify_signature(&self, op: &AuthorizedOperation) -> Result<(), AuthError> {
        let message = op.encode(self.layout);
        match self.scheme.recover_signer(&message, &op.signature) {
            Some(signer) if signer == self.trusted_signer => Ok(()),
            _ => Err(AuthError::InvalidSignature),
        }
    }

    fn check_window(&self, op: &AuthorizedOperation, now: Timestamp) -> Result<(), AuthError> {
        if self.layout == MessageLayout::Windowed && now < op.min_timestamp {
            return Err(AuthError::NotYetValid { now, min_timestamp: op.min_timestamp });
        }
        if now > op.max_timestamp {
            return Err(AuthError::Expired { now, max_timestamp: op.max_timestamp });
        }
        Ok(())
    }

    /// Run every check without consuming anything.
    pub fn check(&self, op: &AuthorizedOperation, now: Timestamp) -> Result<(), AuthError> {
        let result = self
            .verify_signature(op)
            .and_then(|()| self.check_window(op, now))
            .and_then(|()| self.nonces.ensure_fresh(&op.nonce));
        if let Err(e) = &result {
            debug!(nonce = %op.nonce, error = %e, "operation not valid");
        }
        result
    }

    /// Non-mutating form of [`check`](Self::check).
    pub fn is_valid_operation(&self, op: &AuthorizedOperation, now: Timestamp) -> bool {
        self.check(op, now).is_ok()
    }

    /// Check `op`, run `effect`, then consume the nonce.
    ///
    /// If the check or the effect fails the nonce stays fresh.
    pub fn execute<T, E, F>(&mut self, op: &AuthorizedOperation, now: Timestamp, effect: F) -> Result<T, E>
    where
        E: From<AuthError>,
        F: FnOnce() -> Result<T, E>,
    {
        if let Err(e) = self.check(op, now) {
            warn!(nonce = %op.nonce, beneficiary = %op.beneficiary, error = %e, "authorization rejected");
            return Err(e.into());
        }
        let out = effect()?;
        self.nonces.consume(op.nonce)?;
        debug!(nonce = %op.nonce, "nonce consumed");
        Ok(out)
    }
}
