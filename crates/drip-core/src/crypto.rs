//! secp256k1 signer recovery for off-chain authorizations.
//!
//! Uses k256 for the curve and keccak-256 (sha3 crate) for digests.
//!
//! # Signing scheme
//!
//! The off-chain signer hashes the packed message once, then signs the
//! personal-message digest of that hash:
//!
//! ```text
//! digest = keccak256("\x19Ethereum Signed Message:\n32" || keccak256(message))
//! ```
//!
//! Signatures are 65 bytes `r || s || v` with `v` in `{27, 28}` (or the raw
//! recovery id `{0, 1}`). Only low-`s` signatures are accepted, so a given
//! approval has exactly one valid encoding.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use std::fmt;

use crate::constants::{PERSONAL_MESSAGE_PREFIX, SIGNATURE_LEN};
use crate::error::ConfigError;
use crate::traits::SignatureRecovery;
use crate::types::{Address, AuthorizedOperation, Hash256, MessageLayout};

/// keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> Hash256 {
    Hash256(Keccak256::digest(data).into())
}

/// Personal-message digest of a 32-byte hash.
pub fn personal_message_digest(hash: &Hash256) -> Hash256 {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX);
    hasher.update(hash.as_bytes());
    Hash256(hasher.finalize().into())
}

/// Address of a public key: last 20 bytes of keccak-256 over the
/// uncompressed point without its `0x04` tag.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.0[12..]);
    Address(bytes)
}

/// The personal-message recovery scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonalSign;

impl PersonalSign {
    pub fn new() -> Self {
        Self
    }
}

impl SignatureRecovery for PersonalSign {
    fn signing_digest(&self, message: &[u8]) -> Hash256 {
        personal_message_digest(&keccak256(message))
    }

    fn recover(&self, digest: &Hash256, signature: &[u8]) -> Option<Address> {
        if signature.len() != SIGNATURE_LEN {
            return None;
        }
        let v = signature[64];
        let recovery_byte = match v {
            27 | 28 => v - 27,
            0 | 1 => v,
            _ => return None,
        };
        let recovery_id = RecoveryId::from_byte(recovery_byte)?;
        let sig = Signature::from_slice(&signature[..64]).ok()?;
        // normalize_s returns Some only for high-s input
        if sig.normalize_s().is_some() {
            return None;
        }
        let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recovery_id).ok()?;
        Some(address_of(&key))
    }
}

/// Off-chain signing key. Used by operator tooling and tests; the
/// protocol itself only verifies.
#[derive(Clone)]
pub struct SignerKey {
    signing_key: SigningKey,
}

impl SignerKey {
    /// Generate a random key using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Create a key from 32 bytes of secret material.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, ConfigError> {
        let signing_key = SigningKey::from_slice(bytes)
            .map_err(|_| ConfigError::InvalidKey("not a valid secp256k1 scalar".to_string()))?;
        Ok(Self { signing_key })
    }

    /// Parse a `0x`-prefixed (or bare) hex secret key.
    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits).map_err(|_| ConfigError::InvalidKey("not hex".to_string()))?;
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| ConfigError::InvalidKey("must be 32 bytes".to_string()))?;
        Self::from_secret_bytes(&bytes)
    }

    pub fn address(&self) -> Address {
        address_of(self.signing_key.verifying_key())
    }

    /// Sign a prehashed digest. Returns `r || s || v` with `v = 27 + recovery id`.
    pub fn sign_digest(&self, digest: &Hash256) -> Result<[u8; SIGNATURE_LEN], ConfigError> {
        let (sig, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| ConfigError::InvalidKey(format!("signing failed: {e}")))?;
        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(&sig.to_bytes());
        out[64] = recovery_id.to_byte() + 27;
        Ok(out)
    }

    /// Sign `message` under the personal-message convention.
    pub fn sign_message(&self, message: &[u8]) -> Result<[u8; SIGNATURE_LEN], ConfigError> {
        self.sign_digest(&PersonalSign.signing_digest(message))
    }

    /// Sign the encoding of `op` under `layout` and store the signature in it.
    pub fn sign_operation(
        &self,
        mut op: AuthorizedOperation,
        layout: MessageLayout,
    ) -> Result<AuthorizedOperation, ConfigError> {
        op.signature = self.sign_message(&op.encode(layout))?.to_vec();
        Ok(op)
    }
}

impl fmt::Debug for SignerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerKey")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::elliptic_curve::scalar::IsHigh;

    const TRUSTED_KEY: &str = "0x3d553d9378d53cfc1f0692983c272e57f42809306ff3109b137fe071bfde8516";
    const TRUSTED_ADDRESS: &str = "0xc2a8a4321454958b39bfc0654baca78ae4e07cf1";

    fn trusted() -> SignerKey {
        SignerKey::from_hex(TRUSTED_KEY).unwrap()
    }

    #[test]
    fn keccak_of_empty_input() {
        assert_eq!(
            keccak256(b"").to_string(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn key_derives_known_address() {
        assert_eq!(trusted().address().to_string(), TRUSTED_ADDRESS);
    }

    #[test]
    fn sign_and_recover() {
        let key = trusted();
        let sig = key.sign_message(b"stake two tickets").unwrap();
        assert!(sig[64] == 27 || sig[64] == 28);
        let recovered = PersonalSign.recover_signer(b"stake two tickets", &sig);
        assert_eq!(recovered, Some(key.address()));
    }

    #[test]
    fn raw_recovery_id_is_accepted() {
        let key = trusted();
        let mut sig = key.sign_message(b"msg").unwrap();
        sig[64] -= 27;
        assert_eq!(PersonalSign.recover_signer(b"msg", &sig), Some(key.address()));
    }

    #[test]
    fn different_message_recovers_different_address() {
        let key = trusted();
        let sig = key.sign_message(b"original").unwrap();
        let recovered = PersonalSign.recover_signer(b"tampered", &sig);
        assert_ne!(recovered, Some(key.address()));
    }

    #[test]
    fn wrong_length_fails_closed() {
        assert_eq!(PersonalSign.recover_signer(b"msg", &[0u8; 64]), None);
        assert_eq!(PersonalSign.recover_signer(b"msg", &[]), None);
    }

    #[test]
    fn bad_recovery_byte_fails_closed() {
        let mut sig = trusted().sign_message(b"msg").unwrap();
        sig[64] = 29;
        assert_eq!(PersonalSign.recover_signer(b"msg", &sig), None);
    }

    #[test]
    fn zero_signature_fails_closed() {
        let mut sig = [0u8; 65];
        sig[64] = 27;
        assert_eq!(PersonalSign.recover_signer(b"msg", &sig), None);
    }

    #[test]
    fn high_s_twin_is_rejected() {
        let key = trusted();
        let digest = PersonalSign.signing_digest(b"malleable");
        let sig = key.sign_digest(&digest).unwrap();

        let parsed = Signature::from_slice(&sig[..64]).unwrap();
        let (r, s) = parsed.split_scalars();
        assert!(!bool::from(s.is_high()));
        let high = Signature::from_scalars(r, -*s).unwrap();

        let mut twin = [0u8; 65];
        twin[..64].copy_from_slice(&high.to_bytes());
        // flipping s flips the parity of the recovered point
        twin[64] = if sig[64] == 27 { 28 } else { 27 };

        assert_eq!(PersonalSign.recover(&digest, &sig), Some(key.address()));
        assert_eq!(PersonalSign.recover(&digest, &twin), None);
    }

    #[test]
    fn signed_operation_recovers_under_its_layout_only() {
        let key = trusted();
        let op = AuthorizedOperation {
            user_id: primitive_types::U256::zero(),
            beneficiary: Address([0x11; 20]),
            quantity: primitive_types::U256::from(2),
            nonce: primitive_types::U256::zero(),
            min_timestamp: 0,
            max_timestamp: 1_700_000_150,
            signature: Vec::new(),
        };
        let signed = key.sign_operation(op, MessageLayout::Windowed).unwrap();
        let windowed = signed.encode(MessageLayout::Windowed);
        let expiry_only = signed.encode(MessageLayout::ExpiryOnly);
        assert_eq!(PersonalSign.recover_signer(&windowed, &signed.signature), Some(key.address()));
        assert_ne!(PersonalSign.recover_signer(&expiry_only, &signed.signature), Some(key.address()));
    }

    #[test]
    fn generated_keys_are_distinct() {
        assert_ne!(SignerKey::generate().address(), SignerKey::generate().address());
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(SignerKey::from_hex("0x1234").is_err());
        assert!(SignerKey::from_hex("zz").is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let dbg = format!("{:?}", trusted());
        assert!(dbg.contains(TRUSTED_ADDRESS));
        assert!(!dbg.contains("3d553d93"));
    }
}
