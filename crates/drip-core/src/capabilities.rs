//! In-memory capability registry.
//!
//! Admin rules:
//! - a `Minter` may add other minters;
//! - a `WhitelistAdmin` may add or remove `Whitelisted` accounts and add
//!   other admins;
//! - any holder may renounce its own capability.
//!
//! There is no `remove` for `Minter`: a minter leaves only by renouncing,
//! so no minter can strip another.
//!
//! [`grant`](MemoryCapabilities::grant) bypasses the rules and is meant for
//! deployment wiring only.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::LedgerError;
use crate::traits::CapabilityRegistry;
use crate::types::{Address, Capability};

#[derive(Debug, Default)]
pub struct MemoryCapabilities {
    roles: RwLock<HashMap<Capability, HashSet<Address>>>,
}

impl MemoryCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a capability unconditionally.
    pub fn grant(&self, capability: Capability, account: &Address) {
        self.roles.write().entry(capability).or_default().insert(*account);
        debug!(%capability, %account, "capability granted");
    }

    /// Capability a caller must hold to manage `capability`.
    fn admin_of(capability: Capability) -> Capability {
        match capability {
            Capability::Minter => Capability::Minter,
            Capability::Whitelisted | Capability::WhitelistAdmin => Capability::WhitelistAdmin,
        }
    }

    /// Add `account` to `capability`, on behalf of `caller`.
    pub fn add(&self, caller: &Address, capability: Capability, account: &Address) -> Result<(), LedgerError> {
        self.require(Self::admin_of(capability), caller)?;
        self.grant(capability, account);
        Ok(())
    }

    /// Remove `account` from `Whitelisted`, on behalf of a whitelist admin.
    ///
    /// Other capabilities can only be renounced by their holder.
    pub fn remove_whitelisted(&self, caller: &Address, account: &Address) -> Result<(), LedgerError> {
        self.require(Capability::WhitelistAdmin, caller)?;
        self.revoke(Capability::Whitelisted, account);
        Ok(())
    }

    /// Drop the caller's own capability.
    pub fn renounce(&self, caller: &Address, capability: Capability) -> Result<(), LedgerError> {
        self.require(capability, caller)?;
        self.revoke(capability, caller);
        Ok(())
    }

    fn revoke(&self, capability: Capability, account: &Address) {
        if let Some(set) = self.roles.write().get_mut(&capability) {
            set.remove(account);
        }
        debug!(%capability, %account, "capability revoked");
    }

    /// All holders of a capability, sorted.
    pub fn holders(&self, capability: Capability) -> Vec<Address> {
        let mut out: Vec<Address> = self
            .roles
            .read()
            .get(&capability)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        out.sort();
        out
    }
}

impl CapabilityRegistry for MemoryCapabilities {
    fn has(&self, capability: Capability, account: &Address) -> bool {
        self.roles
            .read()
            .get(&capability)
            .is_some_and(|set| set.contains(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(seed: u8) -> Address {
        Address([seed; 20])
    }

    #[test]
    fn grant_and_has() {
        let caps = MemoryCapabilities::new();
        assert!(!caps.has(Capability::Minter, &addr(1)));
        caps.grant(Capability::Minter, &addr(1));
        assert!(caps.has(Capability::Minter, &addr(1)));
        assert!(!caps.has(Capability::Whitelisted, &addr(1)));
    }

    #[test]
    fn minter_adds_minter() {
        let caps = MemoryCapabilities::new();
        caps.grant(Capability::Minter, &addr(1));
        caps.add(&addr(1), Capability::Minter, &addr(2)).unwrap();
        assert!(caps.has(Capability::Minter, &addr(2)));
    }

    #[test]
    fn non_minter_cannot_add_minter() {
        let caps = MemoryCapabilities::new();
        let err = caps.add(&addr(3), Capability::Minter, &addr(2)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::MissingCapability { capability: Capability::Minter, account: addr(3) }
        );
        assert!(!caps.has(Capability::Minter, &addr(2)));
    }

    #[test]
    fn whitelist_admin_manages_whitelist() {
        let caps = MemoryCapabilities::new();
        caps.grant(Capability::WhitelistAdmin, &addr(1));
        caps.add(&addr(1), Capability::Whitelisted, &addr(5)).unwrap();
        assert!(caps.has(Capability::Whitelisted, &addr(5)));
        caps.remove_whitelisted(&addr(1), &addr(5)).unwrap();
        assert!(!caps.has(Capability::Whitelisted, &addr(5)));
    }

    #[test]
    fn whitelisted_cannot_whitelist_others() {
        let caps = MemoryCapabilities::new();
        caps.grant(Capability::Whitelisted, &addr(1));
        assert!(caps.add(&addr(1), Capability::Whitelisted, &addr(2)).is_err());
        assert!(caps.remove_whitelisted(&addr(1), &addr(1)).is_err());
    }

    #[test]
    fn renounce_drops_own_capability() {
        let caps = MemoryCapabilities::new();
        caps.grant(Capability::WhitelistAdmin, &addr(1));
        caps.add(&addr(1), Capability::WhitelistAdmin, &addr(2)).unwrap();
        caps.renounce(&addr(1), Capability::WhitelistAdmin).unwrap();
        assert!(!caps.has(Capability::WhitelistAdmin, &addr(1)));
        assert!(caps.has(Capability::WhitelistAdmin, &addr(2)));
    }

    #[test]
    fn minter_leaves_only_by_renouncing() {
        let caps = MemoryCapabilities::new();
        caps.grant(Capability::Minter, &addr(1));
        caps.add(&addr(1), Capability::Minter, &addr(2)).unwrap();
        // whitelist removal never touches minters
        caps.grant(Capability::WhitelistAdmin, &addr(1));
        caps.remove_whitelisted(&addr(1), &addr(2)).unwrap();
        assert!(caps.has(Capability::Minter, &addr(2)));

        caps.renounce(&addr(2), Capability::Minter).unwrap();
        assert!(!caps.has(Capability::Minter, &addr(2)));
        assert!(caps.has(Capability::Minter, &addr(1)));
    }

    #[test]
    fn renounce_requires_holding() {
        let caps = MemoryCapabilities::new();
        assert!(caps.renounce(&addr(1), Capability::Minter).is_err());
    }

    #[test]
    fn holders_sorted() {
        let caps = MemoryCapabilities::new();
        caps.grant(Capability::Whitelisted, &addr(9));
        caps.grant(Capability::Whitelisted, &addr(2));
        assert_eq!(caps.holders(Capability::Whitelisted), vec![addr(2), addr(9)]);
        assert!(caps.holders(Capability::Minter).is_empty());
    }
}
