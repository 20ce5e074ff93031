//! Bond Config Vault
//!
//! An owned, order-preserving set of reusable bond configurations. The
//! periodic minter walks this list to decide which bonds to issue; the
//! owner curates it. A configuration is identified by the hash of its full
//! `(collateral, ratios, duration)` tuple, and add/remove are idempotent.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use tranche_common::{
    errors::{BondError, BondResult},
    events::{BondEvent, EventLog},
    math,
    types::{config_hash, is_zero_address, Address},
    Vec,
};

/// A reusable bond configuration.
///
/// Unlike a live bond, a config carries a `duration` rather than an
/// absolute maturity date; each issuance matures `duration` after its
/// creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct BondConfig {
    pub collateral: Address,
    pub tranche_ratios: Vec<u64>,
    pub duration: u64,
}

impl BondConfig {
    /// Hash identifying this configuration tuple
    pub fn id(&self) -> [u8; 32] {
        config_hash(&self.collateral, &self.tranche_ratios, self.duration)
    }
}

/// Owned registry of bond configurations, in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct BondConfigVault {
    owner: Address,
    configs: Vec<BondConfig>,
    #[serde(skip)]
    #[borsh(skip)]
    events: EventLog,
}

impl BondConfigVault {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            configs: Vec::new(),
            events: EventLog::new(),
        }
    }

    // ============ Views ============

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn num_configs(&self) -> usize {
        self.configs.len()
    }

    pub fn config_at(&self, index: usize) -> BondResult<&BondConfig> {
        self.configs.get(index).ok_or(BondError::ConfigIndexOutOfBounds {
            index,
            len: self.configs.len(),
        })
    }

    pub fn configs(&self) -> &[BondConfig] {
        &self.configs
    }

    pub fn contains(&self, config: &BondConfig) -> bool {
        let id = config.id();
        self.configs.iter().any(|c| c.id() == id)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    // ============ Owner operations ============

    /// Add a configuration. Returns `false` (and emits nothing) when an
    /// identical configuration is already stored.
    pub fn add_config(&mut self, caller: &Address, config: BondConfig, now: u64) -> BondResult<bool> {
        self.require_owner(caller)?;
        if is_zero_address(&config.collateral) {
            return Err(BondError::InvalidAddress {
                reason: "zero collateral token address",
            });
        }
        math::validate_tranche_ratios(&config.tranche_ratios)?;
        if config.duration == 0 {
            return Err(BondError::ZeroAmount);
        }
        if self.contains(&config) {
            return Ok(false);
        }
        self.events.emit(BondEvent::BondConfigAdded {
            collateral: config.collateral,
            tranche_ratios: config.tranche_ratios.clone(),
            duration: config.duration,
            timestamp: now,
        });
        self.configs.push(config);
        Ok(true)
    }

    /// Remove a configuration by value, preserving the order of the rest.
    /// Returns `false` (and emits nothing) when it was not stored.
    pub fn remove_config(
        &mut self,
        caller: &Address,
        config: &BondConfig,
        now: u64,
    ) -> BondResult<bool> {
        self.require_owner(caller)?;
        let id = config.id();
        let Some(position) = self.configs.iter().position(|c| c.id() == id) else {
            return Ok(false);
        };
        let removed = self.configs.remove(position);
        self.events.emit(BondEvent::BondConfigRemoved {
            collateral: removed.collateral,
            tranche_ratios: removed.tranche_ratios,
            duration: removed.duration,
            timestamp: now,
        });
        Ok(true)
    }

    /// Hand the vault to a new owner.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
        now: u64,
    ) -> BondResult<()> {
        self.require_owner(caller)?;
        if is_zero_address(&new_owner) {
            return Err(BondError::InvalidAddress {
                reason: "zero owner address",
            });
        }
        let old_owner = self.owner;
        self.owner = new_owner;
        self.events.emit(BondEvent::OwnershipTransferred {
            old_owner,
            new_owner,
            timestamp: now,
        });
        Ok(())
    }

    fn require_owner(&self, caller: &Address) -> BondResult<()> {
        if caller != &self.owner {
            return Err(BondError::Unauthorized {
                expected: self.owner,
                actual: *caller,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Address = [0x0Au8; 32];
    const OTHER: Address = [0x0Bu8; 32];
    const COLLATERAL: Address = [0x0Cu8; 32];

    fn config(duration: u64) -> BondConfig {
        BondConfig {
            collateral: COLLATERAL,
            tranche_ratios: [200, 300, 500].to_vec(),
            duration,
        }
    }

    #[test]
    fn test_add_and_remove_are_idempotent() {
        let mut vault = BondConfigVault::new(OWNER);

        assert!(vault.add_config(&OWNER, config(100), 1).unwrap());
        assert!(!vault.add_config(&OWNER, config(100), 2).unwrap());
        assert_eq!(vault.num_configs(), 1);
        assert_eq!(vault.events().len(), 1);

        assert!(vault.remove_config(&OWNER, &config(100), 3).unwrap());
        assert!(!vault.remove_config(&OWNER, &config(100), 4).unwrap());
        assert_eq!(vault.num_configs(), 0);
        assert_eq!(vault.events().len(), 2);
    }

    #[test]
    fn test_removal_preserves_order() {
        let mut vault = BondConfigVault::new(OWNER);
        vault.add_config(&OWNER, config(100), 1).unwrap();
        vault.add_config(&OWNER, config(200), 1).unwrap();
        vault.add_config(&OWNER, config(300), 1).unwrap();

        vault.remove_config(&OWNER, &config(200), 2).unwrap();
        assert_eq!(vault.config_at(0).unwrap().duration, 100);
        assert_eq!(vault.config_at(1).unwrap().duration, 300);
        assert!(matches!(
            vault.config_at(2),
            Err(BondError::ConfigIndexOutOfBounds { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_validation_on_add() {
        let mut vault = BondConfigVault::new(OWNER);
        let mut bad = config(100);
        bad.tranche_ratios = [10, 20].to_vec();
        assert_eq!(
            vault.add_config(&OWNER, bad, 1),
            Err(BondError::InvalidTotalRatio { total: 30 })
        );
        assert_eq!(
            vault.add_config(&OWNER, config(0), 1),
            Err(BondError::ZeroAmount)
        );
    }

    #[test]
    fn test_owner_only_mutation() {
        let mut vault = BondConfigVault::new(OWNER);
        assert_eq!(
            vault.add_config(&OTHER, config(100), 1),
            Err(BondError::Unauthorized {
                expected: OWNER,
                actual: OTHER
            })
        );

        vault.transfer_ownership(&OWNER, OTHER, 2).unwrap();
        assert_eq!(vault.owner(), OTHER);
        // the old owner is locked out
        assert!(vault.add_config(&OWNER, config(100), 3).is_err());
        assert!(vault.add_config(&OTHER, config(100), 4).unwrap());
    }
}
