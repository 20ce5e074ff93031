//! Periodic Bond Minter
//!
//! Issues a fresh bond for every configuration in a vault, rate-limited by
//! a per-configuration waiting period. Each issuance matures `duration`
//! after its creation time, so repeated mints of the same configuration
//! roll a ladder of bonds.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use bond_controller::BondController;
use tranche_common::{
    collateral::CollateralSpec,
    errors::{BondError, BondResult},
    events::{BondEvent, EventLog},
    types::{config_hash, Address},
};

use crate::config_vault::{BondConfig, BondConfigVault};
use crate::BondFactory;

/// Metadata lookup for the collateral addresses stored in bond configs.
///
/// Configs carry only a collateral address; the minter needs the symbol
/// and decimals to name the tranches it creates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CollateralRegistry {
    specs: BTreeMap<Address, CollateralSpec>,
}

impl CollateralRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: CollateralSpec) {
        self.specs.insert(spec.address, spec);
    }

    pub fn get(&self, collateral: &Address) -> Option<&CollateralSpec> {
        self.specs.get(collateral)
    }
}

/// Rate-limited issuer of the vault's bond configurations.
#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct BondMinter {
    owner: Address,
    /// Minimum time between two issuances of the same configuration
    waiting_period: u64,
    /// Last issuance time per configuration hash
    last_mint: BTreeMap<[u8; 32], u64>,
    #[serde(skip)]
    #[borsh(skip)]
    events: EventLog,
}

impl BondMinter {
    pub fn new(owner: Address, waiting_period: u64) -> Self {
        Self {
            owner,
            waiting_period,
            last_mint: BTreeMap::new(),
            events: EventLog::new(),
        }
    }

    // ============ Views ============

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn waiting_period(&self) -> u64 {
        self.waiting_period
    }

    /// When this configuration was last issued, if ever
    pub fn last_mint(&self, config: &BondConfig) -> Option<u64> {
        self.last_mint.get(&config.id()).copied()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    // ============ Operations ============

    /// Change the waiting period. Owner only.
    pub fn set_waiting_period(&mut self, caller: &Address, period: u64, now: u64) -> BondResult<()> {
        if caller != &self.owner {
            return Err(BondError::Unauthorized {
                expected: self.owner,
                actual: *caller,
            });
        }
        let old_period = self.waiting_period;
        self.waiting_period = period;
        self.events.emit(BondEvent::WaitingPeriodUpdated {
            old_period,
            new_period: period,
            timestamp: now,
        });
        Ok(())
    }

    /// Issue one bond per vault configuration, in vault order.
    ///
    /// Every configuration is gated on `now >= last_mint + waiting_period`;
    /// a single too-soon configuration fails the whole batch rather than
    /// being skipped, so callers never get a partially rolled ladder. All
    /// gates and registry lookups are checked before any bond is created.
    pub fn mint_bonds(
        &mut self,
        factory: &mut BondFactory,
        vault: &BondConfigVault,
        registry: &CollateralRegistry,
        now: u64,
    ) -> BondResult<Vec<BondController>> {
        for config in vault.configs() {
            if registry.get(&config.collateral).is_none() {
                return Err(BondError::UnknownCollateral {
                    collateral: config.collateral,
                });
            }
            if let Some(&last) = self.last_mint.get(&config.id()) {
                let ready = last
                    .checked_add(self.waiting_period)
                    .ok_or(BondError::Overflow)?;
                if now < ready {
                    return Err(BondError::MintTooSoon {
                        last_mint: last,
                        waiting_period: self.waiting_period,
                        now,
                    });
                }
            }
            // a bond with this issuance's exact tuple may already exist
            // from a direct factory call
            let maturity_date = now
                .checked_add(config.duration)
                .ok_or(BondError::Overflow)?;
            let bond_id = config_hash(&config.collateral, &config.tranche_ratios, maturity_date);
            if factory.is_created(&bond_id) {
                return Err(BondError::BondAlreadyExists { bond_id });
            }
        }

        let mut bonds = Vec::with_capacity(vault.num_configs());
        for config in vault.configs() {
            let spec = registry.get(&config.collateral).ok_or(BondError::UnknownCollateral {
                collateral: config.collateral,
            })?;
            let maturity_date = now
                .checked_add(config.duration)
                .ok_or(BondError::Overflow)?;
            let bond = factory.create_bond(
                spec,
                &config.tranche_ratios,
                maturity_date,
                self.owner,
                None,
                now,
            )?;
            self.last_mint.insert(config.id(), now);
            bonds.push(bond);
        }
        Ok(bonds)
    }
}
