//! Protocol constants. All token amounts are in base units (1 token = 10^18 units).

use primitive_types::U256;

/// Decimal places of the token.
pub const DECIMALS: u32 = 18;

/// One whole token in base units.
pub const TOKEN: u128 = 1_000_000_000_000_000_000;

/// Supply credited to the initial beneficiary when the ledger is created.
pub const INITIAL_SUPPLY: u128 = 2_100_000_000 * TOKEN;

/// Percent of every mint routed to the team table instead of the pool.
pub const TEAM_SHARE_PERCENT: u64 = 10;

/// Denominator for every percentage in the protocol.
pub const PERCENT_PRECISION: u64 = 100;

/// Length of one decay period in seconds (32 days).
pub const DEFAULT_PERIOD_SECONDS: u64 = 2_764_800;

/// Tokens emitted over the first decay period.
pub const DEFAULT_TOKENS_PER_PERIOD: u128 = 672_000_000 * TOKEN;

/// Per-period shrink of the emission rate, in percent.
pub const DEFAULT_DECAY_PERCENT: u8 = 21;

/// Constant rate of the linear scheduler: the first period's tokens spread
/// evenly over its seconds.
pub const DEFAULT_TOKENS_PER_SECOND: u128 = DEFAULT_TOKENS_PER_PERIOD / DEFAULT_PERIOD_SECONDS as u128;

/// Price of one stake ticket in base units.
pub const DEFAULT_TOKENS_PER_TICKET: u128 = 100 * TOKEN;

/// Byte length of an account address.
pub const ADDRESS_LEN: usize = 20;

/// Byte length of a recoverable signature (`r || s || v`).
pub const SIGNATURE_LEN: usize = 65;

/// Prefix of the personal-message signing convention for a 32-byte payload.
pub const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Convert a `u128` constant into a [`U256`] amount.
pub fn amount(value: u128) -> U256 {
    U256::from(value)
}
