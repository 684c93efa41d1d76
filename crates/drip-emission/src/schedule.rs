//! Geometric decay schedule.
//!
//! Time since `start_time` is cut into periods of `period_seconds`.
//! Period `i` (0-based) pays `tokens_i` tokens, where
//!
//! ```text
//! tokens_0     = tokens_per_period
//! tokens_{i+1} = tokens_i * (100 - decay_percent) / 100
//! ```
//!
//! The schedule starts one full period before activation, so the first
//! period anyone is paid for is period 1, already decayed once.
//!
//! A span `[from, to)` is integrated one sub-interval at a time, each
//! sub-interval lying inside a single period and paying
//! `seconds * tokens_i / period_seconds`, truncated once. Once the
//! per-period amount stops changing (no decay) or reaches zero, the rest of
//! the span is a single sub-interval.

use drip_core::constants::PERCENT_PRECISION;
use drip_core::error::{ConfigError, EmissionError};
use drip_core::traits::EmissionCurve;
use drip_core::types::Timestamp;
use primitive_types::U256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmissionSchedule {
    period_seconds: u64,
    tokens_per_period: U256,
    decay_percent: u8,
    start_time: Timestamp,
}

impl EmissionSchedule {
    /// Build a schedule activated at `activation`.
    ///
    /// Fails if the period is zero, the decay is 100% or more, or
    /// `activation` is earlier than one period after the epoch.
    pub fn new(
        period_seconds: u64,
        tokens_per_period: U256,
        decay_percent: u8,
        activation: Timestamp,
    ) -> Result<Self, ConfigError> {
        if period_seconds == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if u64::from(decay_percent) >= PERCENT_PRECISION {
            return Err(ConfigError::DecayPercentTooHigh(decay_percent));
        }
        let start_time = activation
            .checked_sub(period_seconds)
            .ok_or(ConfigError::StartTimeUnderflow { activation, period: period_seconds })?;
        Ok(Self {
            period_seconds,
            tokens_per_period,
            decay_percent,
            start_time,
        })
    }

    pub fn period_seconds(&self) -> u64 {
        self.period_seconds
    }

    pub fn tokens_per_period(&self) -> U256 {
        self.tokens_per_period
    }

    pub fn decay_percent(&self) -> u8 {
        self.decay_percent
    }

    /// Beginning of period 0, one period before activation.
    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    /// 0-based period containing `t`. Times before the start count as period 0.
    pub fn period_index(&self, t: Timestamp) -> u64 {
        t.saturating_sub(self.start_time) / self.period_seconds
    }

    /// First second of period `index`, or `None` past the end of time.
    pub fn period_start(&self, index: u64) -> Option<Timestamp> {
        index
            .checked_mul(self.period_seconds)
            .and_then(|offset| self.start_time.checked_add(offset))
    }

    fn decay_step(&self, tokens: U256) -> Result<U256, EmissionError> {
        let keep = PERCENT_PRECISION - u64::from(self.decay_percent);
        tokens
            .checked_mul(U256::from(keep))
            .map(|scaled| scaled / U256::from(PERCENT_PRECISION))
            .ok_or(EmissionError::ArithmeticOverflow)
    }

    /// Tokens paid over the whole of period `index`.
    pub fn period_tokens(&self, index: u64) -> Result<U256, EmissionError> {
        if self.decay_percent == 0 {
            return Ok(self.tokens_per_period);
        }
        let mut tokens = self.tokens_per_period;
        for _ in 0..index {
            if tokens.is_zero() {
                break;
            }
            tokens = self.decay_step(tokens)?;
        }
        Ok(tokens)
    }

    fn pay(&self, seconds: u64, tokens: U256) -> Result<U256, EmissionError> {
        U256::from(seconds)
            .checked_mul(tokens)
            .map(|scaled| scaled / U256::from(self.period_seconds))
            .ok_or(EmissionError::ArithmeticOverflow)
    }
}

impl EmissionCurve for EmissionSchedule {
    fn emitted_between(&self, from: Timestamp, to: Timestamp) -> Result<U256, EmissionError> {
        if to <= from {
            return Ok(U256::zero());
        }

        let mut index = self.period_index(from);
        let mut tokens = self.period_tokens(index)?;
        let mut cursor = from;
        let mut total = U256::zero();

        while cursor < to && !tokens.is_zero() {
            let next = self.decay_step(tokens)?;
            let stop = if next == tokens {
                to
            } else {
                match index.checked_add(1).and_then(|i| self.period_start(i)) {
                    Some(boundary) => boundary.min(to),
                    None => to,
                }
            };
            let paid = self.pay(stop - cursor, tokens)?;
            total = total.checked_add(paid).ok_or(EmissionError::ArithmeticOverflow)?;
            cursor = stop;
            index = index.saturating_add(1);
            tokens = next;
        }

        Ok(total)
    }
}
