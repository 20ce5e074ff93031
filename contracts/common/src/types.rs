//! Core Types for the Tranche Protocol
//!
//! Fundamental identifiers shared across the contracts, plus the
//! domain-tagged hash derivation used in place of on-chain deployment
//! addresses.

use sha2::{Digest, Sha256};

/// Type alias for addresses (32-byte hash)
pub type Address = [u8; 32];

/// Type alias for bond identifiers
pub type BondId = [u8; 32];

/// The all-zero address, never a valid principal
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Returns true if the address is the zero address
pub fn is_zero_address(address: &Address) -> bool {
    address == &ZERO_ADDRESS
}

/// Derive a deterministic address from a domain tag and input parts.
///
/// The original deployment used a clone factory, where every entity got a
/// host-assigned contract address; off-chain we derive the same identity
/// from the creation parameters instead.
pub fn derive_address(domain: &[u8], parts: &[&[u8]]) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Hash identifying a bond configuration tuple.
///
/// Two bonds (or two stored configs) are "the same" exactly when their
/// collateral, ratio list, and duration-or-maturity value all match.
pub fn config_hash(collateral: &Address, tranche_ratios: &[u64], time_value: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"tranche/bond-config");
    hasher.update(collateral);
    hasher.update((tranche_ratios.len() as u64).to_le_bytes());
    for ratio in tranche_ratios {
        hasher.update(ratio.to_le_bytes());
    }
    hasher.update(time_value.to_le_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_address() {
        assert!(is_zero_address(&ZERO_ADDRESS));
        assert!(!is_zero_address(&[1u8; 32]));
    }

    #[test]
    fn test_derive_address_deterministic() {
        let a = derive_address(b"tranche/test", &[&[1, 2, 3], &[4]]);
        let b = derive_address(b"tranche/test", &[&[1, 2, 3], &[4]]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_address_part_boundaries() {
        // [1,2]+[3] and [1]+[2,3] must not collide
        let a = derive_address(b"tranche/test", &[&[1, 2], &[3]]);
        let b = derive_address(b"tranche/test", &[&[1], &[2, 3]]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_config_hash_sensitivity() {
        let collateral = [7u8; 32];
        let base = config_hash(&collateral, &[200, 300, 500], 100);
        assert_eq!(base, config_hash(&collateral, &[200, 300, 500], 100));
        assert_ne!(base, config_hash(&collateral, &[200, 300, 500], 101));
        assert_ne!(base, config_hash(&collateral, &[500, 300, 200], 100));
        assert_ne!(base, config_hash(&[8u8; 32], &[200, 300, 500], 100));
    }
}
