//! Stake ledger.
//!
//! Stakes are bought in tickets of `tokens_per_ticket` tokens and held in
//! custody on the ledger's own account. The custody balance always equals
//! [`total_staked`](StakeLedger::total_staked).
//!
//! Staking from the pool and withdrawing both need an operation signed by
//! the trusted signer over the windowed layout; `quantity` is a ticket
//! count in both.

use std::collections::HashMap;
use std::sync::Arc;

use drip_core::error::{ConfigError, DripError, StakeError};
use drip_core::traits::{CustodialPool, TokenLedger};
use drip_core::types::{Address, AuthorizedOperation, MessageLayout, Timestamp};
use primitive_types::U256;
use tracing::info;

use crate::authorizer::Authorizer;

pub struct StakeLedger {
    address: Address,
    token: Arc<dyn TokenLedger>,
    pool: Arc<dyn CustodialPool>,
    tokens_per_ticket: U256,
    auth: Authorizer,
    stakes: HashMap<Address, U256>,
    total_staked: U256,
}

fn ticket_amount(tickets: U256, tokens_per_ticket: U256) -> Result<U256, StakeError> {
    tickets.checked_mul(tokens_per_ticket).ok_or(StakeError::Overflow)
}

impl StakeLedger {
    /// Create a stake ledger holding custody on `address`, funded from `pool`.
    pub fn new(
        address: Address,
        pool: Arc<dyn CustodialPool>,
        trusted_signer: Address,
        tokens_per_ticket: U256,
    ) -> Result<Self, ConfigError> {
        Self::with_authorizer(address, pool, Authorizer::new(trusted_signer, MessageLayout::Windowed), tokens_per_ticket)
    }

    /// Create a stake ledger with a preconfigured authorizer.
    pub fn with_authorizer(
        address: Address,
        pool: Arc<dyn CustodialPool>,
        auth: Authorizer,
        tokens_per_ticket: U256,
    ) -> Result<Self, ConfigError> {
        if tokens_per_ticket.is_zero() {
            return Err(ConfigError::ZeroTicketPrice);
        }
        Ok(Self {
            address,
            token: pool.token(),
            pool,
            tokens_per_ticket,
            auth,
            stakes: HashMap::new(),
            total_staked: U256::zero(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn tokens_per_ticket(&self) -> U256 {
        self.tokens_per_ticket
    }

    pub fn trusted_signer(&self) -> Address {
        self.auth.trusted_signer()
    }

    pub fn stake_of(&self, account: &Address) -> U256 {
        self.stakes.get(account).copied().unwrap_or_default()
    }

    pub fn is_stakeholder(&self, account: &Address) -> bool {
        !self.stake_of(account).is_zero()
    }

    pub fn total_staked(&self) -> U256 {
        self.total_staked
    }

    /// Accounts currently holding a stake, sorted.
    pub fn stakeholders(&self) -> Vec<Address> {
        let mut out: Vec<Address> = self.stakes.keys().copied().collect();
        out.sort();
        out
    }

    pub fn is_valid_operation(&self, op: &AuthorizedOperation, now: Timestamp) -> bool {
        self.auth.is_valid_operation(op, now)
    }

    /// Balances after crediting `amount` to `account`.
    fn credited(&self, account: &Address, amount: U256) -> Result<(U256, U256), StakeError> {
        let stake = self.stake_of(account).checked_add(amount).ok_or(StakeError::Overflow)?;
        let total = self.total_staked.checked_add(amount).ok_or(StakeError::Overflow)?;
        Ok((stake, total))
    }

    fn commit(&mut self, account: Address, (stake, total): (U256, U256)) {
        if stake.is_zero() {
            self.stakes.remove(&account);
        } else {
            self.stakes.insert(account, stake);
        }
        self.total_staked = total;
    }

    /// Stake `tickets` from the caller's own wallet.
    ///
    /// The caller must have approved this ledger's address for the amount.
    pub fn stake_from_wallet(&mut self, caller: &Address, tickets: U256) -> Result<U256, DripError> {
        let amount = ticket_amount(tickets, self.tokens_per_ticket)?;
        let next = self.credited(caller, amount)?;
        self.token.transfer_from(&self.address, caller, &self.address, amount)?;
        self.commit(*caller, next);
        info!(account = %caller, %tickets, %amount, "staked from wallet");
        Ok(amount)
    }

    /// Stake `op.quantity` tickets for `op.beneficiary`, paid by the pool.
    pub fn stake_from_pool(&mut self, op: &AuthorizedOperation, now: Timestamp) -> Result<U256, DripError> {
        let beneficiary = op.beneficiary;
        let priced = ticket_amount(op.quantity, self.tokens_per_ticket)
            .and_then(|amount| Ok((amount, self.credited(&beneficiary, amount)?)));
        let pool = &self.pool;
        let me = self.address;

        let (amount, next) = self.auth.execute(op, now, || -> Result<_, DripError> {
            let (amount, next) = priced?;
            pool.transfer(&me, &me, amount)?;
            Ok((amount, next))
        })?;

        self.commit(beneficiary, next);
        info!(account = %beneficiary, tickets = %op.quantity, %amount, nonce = %op.nonce, "staked from pool");
        Ok(amount)
    }

    /// Return `op.quantity` tickets' worth of stake to `op.beneficiary`'s wallet.
    pub fn withdraw(&mut self, op: &AuthorizedOperation, now: Timestamp) -> Result<U256, DripError> {
        let beneficiary = op.beneficiary;
        let have = self.stake_of(&beneficiary);
        let total = self.total_staked;
        let tokens_per_ticket = self.tokens_per_ticket;
        let token = &self.token;
        let me = self.address;

        let (amount, next) = self.auth.execute(op, now, || -> Result<_, DripError> {
            let amount = ticket_amount(op.quantity, tokens_per_ticket)?;
            let stake = have
                .checked_sub(amount)
                .ok_or(StakeError::InsufficientStake { have, need: amount })?;
            // custody never drops below any single stake
            let total = total.checked_sub(amount).ok_or(StakeError::Overflow)?;
            token.transfer(&me, &beneficiary, amount)?;
            Ok((amount, (stake, total)))
        })?;

        self.commit(beneficiary, next);
        info!(account = %beneficiary, tickets = %op.quantity, %amount, nonce = %op.nonce, "stake withdrawn");
        Ok(amount)
    }
}
