//! Constant-rate emission: `(to - from) * tokens_per_second`.

use drip_core::error::EmissionError;
use drip_core::traits::EmissionCurve;
use drip_core::types::Timestamp;
use primitive_types::U256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinearEmission {
    tokens_per_second: U256,
}

impl LinearEmission {
    pub fn new(tokens_per_second: U256) -> Self {
        Self { tokens_per_second }
    }

    pub fn tokens_per_second(&self) -> U256 {
        self.tokens_per_second
    }
}

impl EmissionCurve for LinearEmission {
    fn emitted_between(&self, from: Timestamp, to: Timestamp) -> Result<U256, EmissionError> {
        let seconds = to.saturating_sub(from);
        U256::from(seconds)
            .checked_mul(self.tokens_per_second)
            .ok_or(EmissionError::ArithmeticOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drip_core::constants::{amount, DEFAULT_TOKENS_PER_SECOND};

    #[test]
    fn pays_per_second() {
        let curve = LinearEmission::new(amount(DEFAULT_TOKENS_PER_SECOND));
        assert_eq!(curve.emitted_between(1_000, 1_100).unwrap(), amount(DEFAULT_TOKENS_PER_SECOND) * U256::from(100));
    }

    #[test]
    fn reversed_span_is_zero() {
        let curve = LinearEmission::new(U256::from(7));
        assert_eq!(curve.emitted_between(50, 10).unwrap(), U256::zero());
    }

    #[test]
    fn overflow_is_reported() {
        let curve = LinearEmission::new(U256::MAX);
        assert_eq!(curve.emitted_between(0, 2), Err(EmissionError::ArithmeticOverflow));
        assert_eq!(curve.emitted_between(0, 1).unwrap(), U256::MAX);
    }

    #[test]
    fn split_spans_are_exactly_additive() {
        let curve = LinearEmission::new(U256::from(13));
        let whole = curve.emitted_between(0, 1_000).unwrap();
        let parts = curve.emitted_between(0, 377).unwrap() + curve.emitted_between(377, 1_000).unwrap();
        assert_eq!(whole, parts);
    }
}
