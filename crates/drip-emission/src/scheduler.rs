//! The mint scheduler.
//!
//! [`Scheduler`] owns the mint clock for one emission curve. Calling
//! [`mint`](Scheduler::mint) pays for `[last_mint, now)`: the pool mints
//! the owed amount to itself and pays out the team cut in the same
//! all-or-nothing batch. The clock only advances once that batch succeeds.
//!
//! Anyone may call `mint`; the pool only checks that the scheduler's own
//! account is whitelisted.

use std::sync::Arc;

use drip_core::error::{ConfigError, DripError, EmissionError};
use drip_core::traits::{CustodialPool, EmissionCurve, PoolOp};
use drip_core::types::{Address, Timestamp};
use primitive_types::U256;
use serde::Serialize;
use tracing::{debug, info};

use crate::linear::LinearEmission;
use crate::schedule::EmissionSchedule;
use crate::team::TeamAllocation;

/// Outcome of one [`Scheduler::mint`] call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MintReceipt {
    pub from: Timestamp,
    pub to: Timestamp,
    pub minted: U256,
    pub pool_share: U256,
    pub team_payouts: Vec<(Address, U256)>,
}

impl MintReceipt {
    fn idle(at: Timestamp) -> Self {
        Self {
            from: at,
            to: at,
            minted: U256::zero(),
            pool_share: U256::zero(),
            team_payouts: Vec::new(),
        }
    }

    /// True when nothing was minted because no time had elapsed.
    pub fn is_idle(&self) -> bool {
        self.from == self.to
    }
}

pub struct Scheduler<C> {
    address: Address,
    curve: C,
    team: TeamAllocation,
    pool: Arc<dyn CustodialPool>,
    activation: Timestamp,
    last_mint: Timestamp,
}

/// Scheduler with period-by-period geometric decay.
pub type DecayingScheduler = Scheduler<EmissionSchedule>;

/// Scheduler with a constant per-second rate.
pub type LinearScheduler = Scheduler<LinearEmission>;

impl<C: EmissionCurve> Scheduler<C> {
    /// Create a scheduler whose clock starts at `activation`.
    ///
    /// `address` is the scheduler's own account; it must be whitelisted on
    /// `pool` before the first mint.
    pub fn new(
        address: Address,
        curve: C,
        team: TeamAllocation,
        pool: Arc<dyn CustodialPool>,
        activation: Timestamp,
    ) -> Self {
        Self {
            address,
            curve,
            team,
            pool,
            activation,
            last_mint: activation,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn curve(&self) -> &C {
        &self.curve
    }

    pub fn team(&self) -> &TeamAllocation {
        &self.team
    }

    pub fn activation_time(&self) -> Timestamp {
        self.activation
    }

    pub fn last_mint_time(&self) -> Timestamp {
        self.last_mint
    }

    /// Tokens a mint at `now` would create.
    pub fn pending(&self, now: Timestamp) -> Result<U256, EmissionError> {
        if now <= self.last_mint {
            return Ok(U256::zero());
        }
        self.curve.emitted_between(self.last_mint, now)
    }

    /// Mint everything owed for `[last_mint_time, now)`.
    ///
    /// A call with `now <= last_mint_time` is a no-op and returns an idle
    /// receipt. On any failure nothing is minted and the clock stays put.
    pub fn mint(&mut self, now: Timestamp) -> Result<MintReceipt, DripError> {
        if now <= self.last_mint {
            debug!(scheduler = %self.address, now, last_mint = self.last_mint, "nothing to mint");
            return Ok(MintReceipt::idle(self.last_mint));
        }

        let minted = self.curve.emitted_between(self.last_mint, now)?;
        let split = self.team.split(minted)?;

        let mut ops = Vec::with_capacity(split.payouts.len() + 1);
        ops.push(PoolOp::Mint { amount: minted });
        ops.extend(
            split
                .payouts
                .iter()
                .map(|&(to, amount)| PoolOp::Transfer { to, amount }),
        );
        self.pool.execute(&self.address, &ops)?;

        let from = self.last_mint;
        self.last_mint = now;
        info!(
            scheduler = %self.address,
            from,
            to = now,
            %minted,
            team = %split.team_share,
            pool = %split.pool_share,
            "minted"
        );

        Ok(MintReceipt {
            from,
            to: now,
            minted,
            pool_share: split.pool_share,
            team_payouts: split.payouts,
        })
    }
}

impl DecayingScheduler {
    /// Decaying scheduler activated at `activation`.
    pub fn decaying(
        address: Address,
        period_seconds: u64,
        tokens_per_period: U256,
        decay_percent: u8,
        team: TeamAllocation,
        pool: Arc<dyn CustodialPool>,
        activation: Timestamp,
    ) -> Result<Self, ConfigError> {
        let curve = EmissionSchedule::new(period_seconds, tokens_per_period, decay_percent, activation)?;
        Ok(Self::new(address, curve, team, pool, activation))
    }

    /// Start of the decay schedule, one period before activation.
    pub fn start_time(&self) -> Timestamp {
        self.curve.start_time()
    }

    pub fn period_index(&self, t: Timestamp) -> u64 {
        self.curve.period_index(t)
    }

    pub fn period_tokens(&self, index: u64) -> Result<U256, EmissionError> {
        self.curve.period_tokens(index)
    }
}

impl LinearScheduler {
    pub fn linear(
        address: Address,
        tokens_per_second: U256,
        team: TeamAllocation,
        pool: Arc<dyn CustodialPool>,
        activation: Timestamp,
    ) -> Self {
        Self::new(address, LinearEmission::new(tokens_per_second), team, pool, activation)
    }

    /// Linear emission has no warm-up period.
    pub fn start_time(&self) -> Timestamp {
        self.activation
    }
}
