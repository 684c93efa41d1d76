//! Error types for the Drip protocol.
//!
//! Every enum maps onto one stable [`code`](DripError::code) so integrators
//! can branch on the kind of failure without matching message text.
use primitive_types::U256;
use thiserror::Error;

use crate::types::{Address, Capability, Timestamp};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("signature is not valid")] InvalidSignature,
    #[error("operation not valid before {min_timestamp} (now {now})")] NotYetValid { now: Timestamp, min_timestamp: Timestamp },
    #[error("operation expired at {max_timestamp} (now {now})")] Expired { now: Timestamp, max_timestamp: Timestamp },
    #[error("nonce {nonce} already consumed")] Replayed { nonce: U256 },
    #[error("tokens were already pulled for nonce {nonce}")] AlreadyPulled { nonce: U256 },
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "authorization",
            Self::NotYetValid { .. } | Self::Expired { .. } => "expired",
            Self::Replayed { .. } | Self::AlreadyPulled { .. } => "replay",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance for {account}: have {have}, need {need}")] InsufficientBalance { account: Address, have: U256, need: U256 },
    #[error("insufficient allowance from {owner} to {spender}: have {have}, need {need}")] InsufficientAllowance { owner: Address, spender: Address, have: U256, need: U256 },
    #[error("{account} does not have the {capability} capability")] MissingCapability { capability: Capability, account: Address },
    #[error("balance overflow")] Overflow,
}

impl LedgerError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientBalance { .. } | Self::InsufficientAllowance { .. } => "insufficient_balance",
            Self::MissingCapability { .. } => "capability",
            Self::Overflow => "arithmetic_overflow",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakeError {
    #[error("insufficient amount of staked tokens: have {have}, need {need}")] InsufficientStake { have: U256, need: U256 },
    #[error("stake amount overflow")] Overflow,
}

impl StakeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientStake { .. } => "insufficient_balance",
            Self::Overflow => "arithmetic_overflow",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmissionError {
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("decay percent must be below 100, got {0}")] DecayPercentTooHigh(u8),
    #[error("period duration must be positive")] ZeroPeriod,
    #[error("team percentages must sum to 100, got {0}")] TeamPercentSum(u64),
    #[error("team allocation is empty")] EmptyTeam,
    #[error("duplicate team member: {0}")] DuplicateTeamMember(Address),
    #[error("activation time {activation} is earlier than one period ({period}s)")] StartTimeUnderflow { activation: Timestamp, period: u64 },
    #[error("tokens per ticket must be positive")] ZeroTicketPrice,
    #[error("invalid address: {0}")] InvalidAddress(String),
    #[error("invalid amount: {0}")] InvalidAmount(String),
    #[error("invalid signing key: {0}")] InvalidKey(String),
    #[error("load: {0}")] Load(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DripError {
    #[error(transparent)] Auth(#[from] AuthError),
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Stake(#[from] StakeError),
    #[error(transparent)] Emission(#[from] EmissionError),
    #[error(transparent)] Config(#[from] ConfigError),
}

impl DripError {
    /// Stable machine-readable code for the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.code(),
            Self::Ledger(e) => e.code(),
            Self::Stake(e) => e.code(),
            Self::Emission(_) => "arithmetic_overflow",
            Self::Config(_) => "configuration",
        }
    }
}
