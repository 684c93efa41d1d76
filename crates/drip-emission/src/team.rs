//! Team cut of every mint.
//!
//! A fixed [`TEAM_SHARE_PERCENT`] of each minted amount is divided among
//! the team by percent. Every division truncates; whatever the members do
//! not receive stays with the pool, so `pool_share + Σ payouts == total`.

use std::collections::HashSet;

use drip_core::constants::{PERCENT_PRECISION, TEAM_SHARE_PERCENT};
use drip_core::error::{ConfigError, EmissionError};
use drip_core::types::Address;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub address: Address,
    /// Share of the team cut, in percent.
    pub percent: u64,
}

/// Ordered team table. Percentages sum to 100.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeamAllocation {
    members: Vec<TeamMember>,
}

/// How one minted amount is divided.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TeamSplit {
    /// `floor(total * TEAM_SHARE_PERCENT / 100)`.
    pub team_share: U256,
    /// Per-member payouts, in table order.
    pub payouts: Vec<(Address, U256)>,
    /// `total - Σ payouts`, including rounding dust.
    pub pool_share: U256,
}

impl TeamAllocation {
    pub fn new(members: Vec<TeamMember>) -> Result<Self, ConfigError> {
        if members.is_empty() {
            return Err(ConfigError::EmptyTeam);
        }
        let mut seen = HashSet::with_capacity(members.len());
        for member in &members {
            if !seen.insert(member.address) {
                return Err(ConfigError::DuplicateTeamMember(member.address));
            }
        }
        let sum = members
            .iter()
            .try_fold(0u64, |acc, m| acc.checked_add(m.percent))
            .ok_or(ConfigError::TeamPercentSum(u64::MAX))?;
        if sum != PERCENT_PRECISION {
            return Err(ConfigError::TeamPercentSum(sum));
        }
        Ok(Self { members })
    }

    /// Build from `(address, percent)` pairs.
    pub fn from_pairs(pairs: &[(Address, u64)]) -> Result<Self, ConfigError> {
        Self::new(
            pairs
                .iter()
                .map(|&(address, percent)| TeamMember { address, percent })
                .collect(),
        )
    }

    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    /// Divide `total` between the team and the pool.
    pub fn split(&self, total: U256) -> Result<TeamSplit, EmissionError> {
        let precision = U256::from(PERCENT_PRECISION);
        let team_share = total
            .checked_mul(U256::from(TEAM_SHARE_PERCENT))
            .ok_or(EmissionError::ArithmeticOverflow)?
            / precision;

        let mut paid = U256::zero();
        let mut payouts = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let share = team_share
                .checked_mul(U256::from(member.percent))
                .ok_or(EmissionError::ArithmeticOverflow)?
                / precision;
            paid = paid.checked_add(share).ok_or(EmissionError::ArithmeticOverflow)?;
            payouts.push((member.address, share));
        }

        // members never receive more than team_share, which is at most total
        let pool_share = total.checked_sub(paid).ok_or(EmissionError::ArithmeticOverflow)?;
        Ok(TeamSplit { team_share, payouts, pool_share })
    }
}
