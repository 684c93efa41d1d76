//! Core protocol types: addresses, hashes, signed authorizations.
//!
//! All token amounts are [`U256`] base units. Timestamps are Unix seconds.

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::ADDRESS_LEN;
use crate::error::ConfigError;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// A 32-byte hash value (keccak-256 digests).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A 20-byte account address.
///
/// Rendered and parsed as `0x`-prefixed lowercase hex. Both user wallets and
/// protocol components (pool, stake ledger, gate) are identified this way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    /// Create an address from raw bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let raw = hex::decode(digits).map_err(|_| ConfigError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; ADDRESS_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| ConfigError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Roles held by accounts, checked by the ledger and the custodial pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    /// May create new tokens on the ledger.
    Minter,
    /// May move funds out of the custodial pool.
    Whitelisted,
    /// May grant and revoke the whitelist capabilities.
    WhitelistAdmin,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Minter => "Minter",
            Self::Whitelisted => "Whitelisted",
            Self::WhitelistAdmin => "WhitelistAdmin",
        };
        f.write_str(name)
    }
}

/// Which fields of an [`AuthorizedOperation`] are covered by the signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageLayout {
    /// `user_id, beneficiary, quantity, nonce, min_timestamp, max_timestamp`.
    /// Used by the stake ledger.
    Windowed,
    /// `user_id, beneficiary, quantity, nonce, max_timestamp`.
    /// Used by the withdrawal gate, which has no lower time bound.
    ExpiryOnly,
}

/// An off-chain signed approval to move funds.
///
/// `quantity` is a ticket count for the stake ledger and a token amount for
/// the withdrawal gate. `min_timestamp == 0` means no lower bound.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedOperation {
    pub user_id: U256,
    pub beneficiary: Address,
    pub quantity: U256,
    pub nonce: U256,
    #[serde(default)]
    pub min_timestamp: Timestamp,
    pub max_timestamp: Timestamp,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

impl AuthorizedOperation {
    /// Canonical packed encoding of the signed fields.
    ///
    /// Integers are 32-byte big-endian words, the beneficiary is its raw
    /// 20 bytes. The signature itself is never part of the message.
    pub fn encode(&self, layout: MessageLayout) -> Vec<u8> {
        let mut data = Vec::with_capacity(32 * 5 + ADDRESS_LEN);
        data.extend_from_slice(&word(self.user_id));
        data.extend_from_slice(self.beneficiary.as_bytes());
        data.extend_from_slice(&word(self.quantity));
        data.extend_from_slice(&word(self.nonce));
        if layout == MessageLayout::Windowed {
            data.extend_from_slice(&word(U256::from(self.min_timestamp)));
        }
        data.extend_from_slice(&word(U256::from(self.max_timestamp)));
        data
    }
}

/// 32-byte big-endian encoding of a `U256`.
pub fn word(value: U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    out
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(digits).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_op() -> AuthorizedOperation {
        AuthorizedOperation {
            user_id: U256::from(1),
            beneficiary: Address([0xAB; 20]),
            quantity: U256::from(2),
            nonce: U256::from(3),
            min_timestamp: 4,
            max_timestamp: 5,
            signature: vec![0x11; 65],
        }
    }

    #[test]
    fn address_display_and_parse() {
        let addr = Address([0x12; 20]);
        let s = addr.to_string();
        assert_eq!(s, format!("0x{}", "12".repeat(20)));
        assert_eq!(s.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn address_parse_accepts_checksummed_hex() {
        let addr: Address = "0x6c510D51C9Db214B6525a6B1D10D9108451457a0".parse().unwrap();
        assert_eq!(addr.to_string(), "0x6c510d51c9db214b6525a6b1d10d9108451457a0");
    }

    #[test]
    fn address_parse_rejects_wrong_length() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("not hex".parse::<Address>().is_err());
    }

    #[test]
    fn windowed_layout_length() {
        let data = sample_op().encode(MessageLayout::Windowed);
        assert_eq!(data.len(), 32 * 5 + 20);
    }

    #[test]
    fn expiry_only_layout_drops_min_timestamp() {
        let op = sample_op();
        let data = op.encode(MessageLayout::ExpiryOnly);
        assert_eq!(data.len(), 32 * 4 + 20);
        assert_eq!(data[data.len() - 1], 5);
        assert_eq!(&data[32..52], op.beneficiary.as_bytes());
    }

    #[test]
    fn encoding_ignores_signature() {
        let a = sample_op();
        let mut b = sample_op();
        b.signature = vec![0x22; 65];
        assert_eq!(a.encode(MessageLayout::Windowed), b.encode(MessageLayout::Windowed));
    }

    #[test]
    fn encoding_is_big_endian() {
        let data = sample_op().encode(MessageLayout::Windowed);
        assert_eq!(data[31], 1);
        assert!(data[..31].iter().all(|b| *b == 0));
    }

    #[test]
    fn operation_json_roundtrip() {
        let op = sample_op();
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("\"signature\":\"0x1111"));
        let back: AuthorizedOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }
}
