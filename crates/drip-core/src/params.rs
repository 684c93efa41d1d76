//! Deployment parameters.
//!
//! Loaded from an optional TOML file, then overlaid with `DRIP__*`
//! environment variables (`DRIP__EMISSION__DECAY_PERCENT=15`). Missing
//! fields fall back to the test-net deployment.

use std::path::Path;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DECAY_PERCENT, DEFAULT_PERIOD_SECONDS, DEFAULT_TOKENS_PER_PERIOD, DEFAULT_TOKENS_PER_SECOND,
    DEFAULT_TOKENS_PER_TICKET, INITIAL_SUPPLY,
};
use crate::error::ConfigError;
use crate::types::Address;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DRIP";

const TESTNET_BENEFICIARY: &str = "0x6c510d51c9db214b6525a6b1d10d9108451457a0";
const TESTNET_ADMIN: &str = "0xb3443c809a105f78a73f92dddbf42e6f70d7f70e";
const TESTNET_TEAM_MEMBER: &str = "0x23be3e0c99377403458e638c7dadc1f7b9f1a9d3";
const TESTNET_SIGNER: &str = "0x81dfec22e6131161f6189c9e05c250c887f02804";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMemberParams {
    pub address: Address,
    /// Share of the team cut, in percent.
    pub percent: u64,
}

/// Emission constants. Amounts are decimal strings in base units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionParams {
    pub period_seconds: u64,
    pub tokens_per_period: String,
    pub decay_percent: u8,
    /// Rate of the linear scheduler.
    pub tokens_per_second: String,
}

impl Default for EmissionParams {
    fn default() -> Self {
        Self {
            period_seconds: DEFAULT_PERIOD_SECONDS,
            tokens_per_period: DEFAULT_TOKENS_PER_PERIOD.to_string(),
            decay_percent: DEFAULT_DECAY_PERCENT,
            tokens_per_second: DEFAULT_TOKENS_PER_SECOND.to_string(),
        }
    }
}

/// Raw deployment parameters as they appear in configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployParams {
    /// Receives the genesis supply.
    pub initial_beneficiary: Address,
    /// Takes over whitelist administration of the pool.
    pub admin: Address,
    pub team: Vec<TeamMemberParams>,
    pub trusted_signer: Address,
    pub initial_supply: String,
    pub tokens_per_ticket: String,
    pub emission: EmissionParams,
}

impl Default for DeployParams {
    fn default() -> Self {
        Self {
            initial_beneficiary: testnet(TESTNET_BENEFICIARY),
            admin: testnet(TESTNET_ADMIN),
            team: vec![TeamMemberParams {
                address: testnet(TESTNET_TEAM_MEMBER),
                percent: 100,
            }],
            trusted_signer: testnet(TESTNET_SIGNER),
            initial_supply: INITIAL_SUPPLY.to_string(),
            tokens_per_ticket: DEFAULT_TOKENS_PER_TICKET.to_string(),
            emission: EmissionParams::default(),
        }
    }
}

fn testnet(s: &str) -> Address {
    s.parse().unwrap_or(Address::ZERO)
}

/// Deployment parameters after parsing and range checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedParams {
    pub initial_beneficiary: Address,
    pub admin: Address,
    /// (member, percent) in configuration order. Sum and uniqueness are
    /// enforced when the team allocation is built.
    pub team: Vec<(Address, u64)>,
    pub trusted_signer: Address,
    pub initial_supply: U256,
    pub tokens_per_ticket: U256,
    pub period_seconds: u64,
    pub tokens_per_period: U256,
    pub decay_percent: u8,
    pub tokens_per_second: U256,
}

fn parse_amount(field: &str, value: &str) -> Result<U256, ConfigError> {
    U256::from_dec_str(value.trim()).map_err(|_| ConfigError::InvalidAmount(format!("{field}: {value:?}")))
}

impl DeployParams {
    /// Load parameters from an optional TOML file plus `DRIP__*` overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .and_then(|cfg| cfg.try_deserialize::<Self>())
            .map_err(|e| ConfigError::Load(e.to_string()))
    }

    /// Check ranges and parse amounts.
    pub fn validate(&self) -> Result<ValidatedParams, ConfigError> {
        if self.emission.period_seconds == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.emission.decay_percent >= 100 {
            return Err(ConfigError::DecayPercentTooHigh(self.emission.decay_percent));
        }
        if self.team.is_empty() {
            return Err(ConfigError::EmptyTeam);
        }
        let tokens_per_ticket = parse_amount("tokens_per_ticket", &self.tokens_per_ticket)?;
        if tokens_per_ticket.is_zero() {
            return Err(ConfigError::ZeroTicketPrice);
        }
        Ok(ValidatedParams {
            initial_beneficiary: self.initial_beneficiary,
            admin: self.admin,
            team: self.team.iter().map(|m| (m.address, m.percent)).collect(),
            trusted_signer: self.trusted_signer,
            initial_supply: parse_amount("initial_supply", &self.initial_supply)?,
            tokens_per_ticket,
            period_seconds: self.emission.period_seconds,
            tokens_per_period: parse_amount("emission.tokens_per_period", &self.emission.tokens_per_period)?,
            decay_percent: self.emission.decay_percent,
            tokens_per_second: parse_amount("emission.tokens_per_second", &self.emission.tokens_per_second)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::amount;
    use parking_lot::Mutex;
    use std::io::Write;

    /// Serializes tests that read the process environment through `load`.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VAR: &str = "DRIP__EMISSION__DECAY_PERCENT";

    #[test]
    fn defaults_are_testnet() {
        let p = DeployParams::default().validate().unwrap();
        assert_eq!(p.trusted_signer.to_string(), TESTNET_SIGNER);
        assert_eq!(p.team, vec![(testnet(TESTNET_TEAM_MEMBER), 100)]);
        assert_eq!(p.period_seconds, 2_764_800);
        assert_eq!(p.decay_percent, 21);
        assert_eq!(p.tokens_per_period, amount(DEFAULT_TOKENS_PER_PERIOD));
        assert_eq!(p.initial_supply, amount(INITIAL_SUPPLY));
    }

    #[test]
    fn testnet_addresses_parse() {
        for s in [TESTNET_BENEFICIARY, TESTNET_ADMIN, TESTNET_TEAM_MEMBER, TESTNET_SIGNER] {
            assert!(!testnet(s).is_zero());
        }
    }

    #[test]
    fn rejects_full_decay() {
        let mut p = DeployParams::default();
        p.emission.decay_percent = 100;
        assert_eq!(p.validate().unwrap_err(), ConfigError::DecayPercentTooHigh(100));
    }

    #[test]
    fn rejects_zero_period() {
        let mut p = DeployParams::default();
        p.emission.period_seconds = 0;
        assert_eq!(p.validate().unwrap_err(), ConfigError::ZeroPeriod);
    }

    #[test]
    fn rejects_empty_team() {
        let mut p = DeployParams::default();
        p.team.clear();
        assert_eq!(p.validate().unwrap_err(), ConfigError::EmptyTeam);
    }

    #[test]
    fn rejects_zero_ticket_price() {
        let mut p = DeployParams::default();
        p.tokens_per_ticket = "0".to_string();
        assert_eq!(p.validate().unwrap_err(), ConfigError::ZeroTicketPrice);
    }

    #[test]
    fn rejects_non_decimal_amount() {
        let mut p = DeployParams::default();
        p.emission.tokens_per_period = "0x10".to_string();
        assert!(matches!(p.validate(), Err(ConfigError::InvalidAmount(_))));
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
trusted_signer = "0x00000000000000000000000000000000000000aa"
tokens_per_ticket = "5"

[[team]]
address = "0x0000000000000000000000000000000000000001"
percent = 60

[[team]]
address = "0x0000000000000000000000000000000000000002"
percent = 40

[emission]
period_seconds = 100
tokens_per_period = "1000"
decay_percent = 50
"#
        )
        .unwrap();

        let params = {
            let _env = ENV_LOCK.lock();
            DeployParams::load(Some(file.path())).unwrap()
        };
        let v = params.validate().unwrap();
        assert_eq!(v.trusted_signer, Address::from_bytes([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xaa]));
        assert_eq!(v.team.len(), 2);
        assert_eq!(v.team[1].1, 40);
        assert_eq!(v.tokens_per_ticket, U256::from(5));
        assert_eq!(v.period_seconds, 100);
        assert_eq!(v.decay_percent, 50);
        // untouched fields keep their defaults
        assert_eq!(v.tokens_per_second, amount(DEFAULT_TOKENS_PER_SECOND));
        assert_eq!(v.admin.to_string(), TESTNET_ADMIN);
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[emission]\nperiod_seconds = 100\ndecay_percent = 50").unwrap();

        let _env = ENV_LOCK.lock();
        // SAFETY: every test touching the environment holds ENV_LOCK.
        unsafe { std::env::set_var(OVERRIDE_VAR, "15") };
        let overridden = DeployParams::load(Some(file.path()));
        unsafe { std::env::remove_var(OVERRIDE_VAR) };

        let overridden = overridden.unwrap();
        assert_eq!(overridden.emission.decay_percent, 15);
        assert_eq!(overridden.emission.period_seconds, 100);

        let plain = DeployParams::load(Some(file.path())).unwrap();
        assert_eq!(plain.emission.decay_percent, 50);
    }

    #[test]
    fn load_missing_file_fails() {
        let err = DeployParams::load(Some(Path::new("/nonexistent/drip-deploy.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn load_bad_address_fails() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, r#"trusted_signer = "0x1234""#).unwrap();
        assert!(matches!(DeployParams::load(Some(file.path())), Err(ConfigError::Load(_))));
    }
}
