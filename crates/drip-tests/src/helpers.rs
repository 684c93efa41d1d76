//! Shared test helpers: a fully wired deployment and signing shortcuts.

use std::sync::Arc;

use drip_auth::{StakeLedger, WithdrawalGate};
use drip_core::bank::Bank;
use drip_core::capabilities::MemoryCapabilities;
use drip_core::crypto::SignerKey;
use drip_core::error::DripError;
use drip_core::ledger::MemoryLedger;
use drip_core::params::{DeployParams, ValidatedParams};
use drip_core::traits::{CustodialPool, TokenLedger};
use drip_core::types::{Address, AuthorizedOperation, Capability, MessageLayout, Timestamp};
use drip_emission::{DecayingScheduler, LinearScheduler, TeamAllocation};
use primitive_types::U256;

/// Account that runs the deployment steps.
pub const DEPLOYER: Address = Address([0xDE; 20]);
pub const BANK: Address = Address([0xBA; 20]);
pub const SCHEDULER: Address = Address([0x4D; 20]);
pub const LINEAR_SCHEDULER: Address = Address([0x41; 20]);
pub const STAKE: Address = Address([0x5A; 20]);
pub const GATE: Address = Address([0x6A; 20]);

/// Activation time used by most scenarios.
pub const ACTIVATION: Timestamp = 1_600_000_000;

/// Signing key of the trusted signer in the reference test suite.
pub const TRUSTED_KEY: &str = "0x3d553d9378d53cfc1f0692983c272e57f42809306ff3109b137fe071bfde8516";

/// A key the deployment does not trust.
pub const UNTRUSTED_KEY: &str = "0x722a39b81353bc9ff3b090d9d970f18096fe94495d4bc5899ebd763d4c309263";

/// Simple address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address([seed; 20])
}

pub fn trusted_signer() -> SignerKey {
    SignerKey::from_hex(TRUSTED_KEY).unwrap()
}

pub fn untrusted_signer() -> SignerKey {
    SignerKey::from_hex(UNTRUSTED_KEY).unwrap()
}

/// Default parameters with `signer` as the trusted signer.
pub fn params_for(signer: &SignerKey) -> ValidatedParams {
    let mut params = DeployParams::default().validate().unwrap();
    params.trusted_signer = signer.address();
    params
}

/// Unsigned operation valid from `min_timestamp` through `max_timestamp`.
pub fn operation(
    beneficiary: Address,
    quantity: u64,
    nonce: u64,
    min_timestamp: Timestamp,
    max_timestamp: Timestamp,
) -> AuthorizedOperation {
    AuthorizedOperation {
        user_id: U256::zero(),
        beneficiary,
        quantity: U256::from(quantity),
        nonce: U256::from(nonce),
        min_timestamp,
        max_timestamp,
        signature: Vec::new(),
    }
}

/// Sign `op` for the stake ledger.
pub fn sign_stake(key: &SignerKey, op: AuthorizedOperation) -> AuthorizedOperation {
    key.sign_operation(op, MessageLayout::Windowed).unwrap()
}

/// Sign `op` for the withdrawal gate.
pub fn sign_pull(key: &SignerKey, op: AuthorizedOperation) -> AuthorizedOperation {
    key.sign_operation(op, MessageLayout::ExpiryOnly).unwrap()
}

/// Every component wired together.
pub struct Deployment {
    pub params: ValidatedParams,
    pub capabilities: Arc<MemoryCapabilities>,
    pub ledger: Arc<MemoryLedger>,
    pub pool: Arc<dyn CustodialPool>,
    pub scheduler: DecayingScheduler,
    pub linear: LinearScheduler,
    pub stake: StakeLedger,
    pub gate: WithdrawalGate,
}

impl Deployment {
    /// Deploy with `params`, activating both schedulers at `activation`.
    ///
    /// Follows the production sequence:
    /// 1. ledger with the genesis supply, deployer as the only minter;
    /// 2. bank, schedulers, stake ledger and gate;
    /// 3. bank and admin become minters, deployer renounces;
    /// 4. modules whitelisted on the bank, admin takes over whitelist
    ///    administration, deployer renounces.
    pub fn deploy(params: ValidatedParams, activation: Timestamp) -> Result<Self, DripError> {
        let capabilities = Arc::new(MemoryCapabilities::new());
        capabilities.grant(Capability::Minter, &DEPLOYER);
        capabilities.grant(Capability::WhitelistAdmin, &DEPLOYER);

        let ledger = Arc::new(MemoryLedger::with_genesis(
            capabilities.clone(),
            &params.initial_beneficiary,
            params.initial_supply,
        ));
        let pool: Arc<dyn CustodialPool> = Arc::new(Bank::new(BANK, ledger.clone(), capabilities.clone()));

        let team = TeamAllocation::from_pairs(&params.team)?;
        let scheduler = DecayingScheduler::decaying(
            SCHEDULER,
            params.period_seconds,
            params.tokens_per_period,
            params.decay_percent,
            team.clone(),
            pool.clone(),
            activation,
        )?;
        let linear = LinearScheduler::linear(LINEAR_SCHEDULER, params.tokens_per_second, team, pool.clone(), activation);
        let stake = StakeLedger::new(STAKE, pool.clone(), params.trusted_signer, params.tokens_per_ticket)?;
        let gate = WithdrawalGate::new(GATE, pool.clone(), params.trusted_signer);

        capabilities.add(&DEPLOYER, Capability::Minter, &BANK)?;
        capabilities.add(&DEPLOYER, Capability::Minter, &params.admin)?;
        capabilities.renounce(&DEPLOYER, Capability::Minter)?;

        for module in [SCHEDULER, LINEAR_SCHEDULER, STAKE, GATE] {
            capabilities.add(&DEPLOYER, Capability::Whitelisted, &module)?;
        }
        capabilities.add(&DEPLOYER, Capability::WhitelistAdmin, &params.admin)?;
        capabilities.renounce(&DEPLOYER, Capability::WhitelistAdmin)?;

        Ok(Self {
            params,
            capabilities,
            ledger,
            pool,
            scheduler,
            linear,
            stake,
            gate,
        })
    }

    /// Deploy with default parameters trusting `signer`.
    pub fn with_signer(signer: &SignerKey) -> Self {
        Self::deploy(params_for(signer), ACTIVATION).unwrap()
    }

    pub fn balance(&self, account: &Address) -> U256 {
        self.ledger.balance_of(account)
    }

    pub fn pool_balance(&self) -> U256 {
        self.pool.balance()
    }

    /// Hand `amount` from the genesis holder to `to`.
    pub fn fund(&self, to: &Address, amount: U256) {
        self.ledger.transfer(&self.params.initial_beneficiary, to, amount).unwrap();
    }

    /// Remove `module` from the bank whitelist, acting as the admin.
    pub fn unwhitelist(&self, module: &Address) {
        self.capabilities.remove_whitelisted(&self.params.admin, module).unwrap();
    }
}
