//! # drip-auth — Signed-authorization fund movements.
//!
//! Both modules accept operations approved off-chain by a trusted signer.
//! They share one check ([`Authorizer`]) and differ only in what happens
//! once the check passes:
//! - [`StakeLedger`]: reversible; tokens go into custody and can be withdrawn.
//! - [`WithdrawalGate`]: one-shot; tokens go straight to the beneficiary.
//!
//! Nonces are tracked per module instance.

pub mod authorizer;
pub mod stake;
pub mod withdrawal;

pub use authorizer::Authorizer;
pub use stake::StakeLedger;
pub use withdrawal::WithdrawalGate;
