//! # drip-core
//! Foundation types, traits and in-memory collaborators for the Drip protocol.

pub mod bank;
pub mod capabilities;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod params;
pub mod replay;
pub mod traits;
pub mod types;

pub use primitive_types::U256;
