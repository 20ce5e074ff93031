//! Bond Factory Contract
//!
//! Creates bonds and their tranche ledgers atomically. Each bond is
//! identified by the hash of its `(collateral, ratios, maturity)` tuple;
//! creating the same configuration twice is rejected, so a bond's identity
//! doubles as its registry key.
//!
//! Tranche ledgers are named after the collateral symbol with a seniority
//! letter: `A`, `B`, `C`, ... in order, and always `Z` for the most junior
//! residual tranche.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use bond_controller::{BondController, Tranche};
use tranche_common::{
    collateral::CollateralSpec,
    constants::labels,
    errors::{BondError, BondResult},
    events::{BondEvent, EventLog},
    math,
    types::{config_hash, derive_address, is_zero_address, Address, BondId},
};
use tranche_token::TrancheLedger;

pub mod config_vault;
pub mod minter;

/// Factory and registry for bond creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct BondFactory {
    /// All bonds ever created, by configuration hash
    created: BTreeMap<BondId, Address>,
    #[serde(skip)]
    #[borsh(skip)]
    events: EventLog,
}

impl BondFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bond and its tranche ledgers.
    ///
    /// The returned controller is fully wired: every ledger is bound to the
    /// bond's derived address and the bond knows its tranche ratios. The
    /// configuration hash is recorded so an identical
    /// `(collateral, ratios, maturity)` tuple cannot be created again.
    pub fn create_bond(
        &mut self,
        collateral: &CollateralSpec,
        tranche_ratios: &[u64],
        maturity_date: u64,
        administrator: Address,
        deposit_limit: Option<u64>,
        now: u64,
    ) -> BondResult<BondController> {
        if is_zero_address(&collateral.address) {
            return Err(BondError::InvalidAddress {
                reason: "zero collateral token address",
            });
        }
        math::validate_tranche_ratios(tranche_ratios)?;
        if maturity_date <= now {
            return Err(BondError::InvalidMaturityDate { maturity_date, now });
        }
        let bond_id = config_hash(&collateral.address, tranche_ratios, maturity_date);
        if self.created.contains_key(&bond_id) {
            return Err(BondError::BondAlreadyExists { bond_id });
        }

        let bond_address = derive_address(b"tranche/bond", &[&bond_id]);
        let mut tranches = Vec::with_capacity(tranche_ratios.len());
        for (i, &ratio) in tranche_ratios.iter().enumerate() {
            let letter = if i == tranche_ratios.len() - 1 {
                labels::RESIDUAL_LETTER
            } else {
                labels::TRANCHE_LETTERS[i] as char
            };
            let ledger_address =
                derive_address(b"tranche/ledger", &[&bond_address, &[i as u8]]);
            tranches.push(Tranche {
                ledger: TrancheLedger::new(
                    ledger_address,
                    bond_address,
                    collateral.address,
                    format!("Tranche {} {letter}", collateral.symbol),
                    format!("TRANCHE-{}-{letter}", collateral.symbol),
                    collateral.decimals,
                ),
                ratio,
            });
        }

        let bond = BondController::new(
            bond_address,
            administrator,
            collateral.address,
            tranches,
            now,
            maturity_date,
            deposit_limit,
        )?;
        self.created.insert(bond_id, bond_address);
        self.events.emit(BondEvent::BondCreated {
            bond_id,
            collateral: collateral.address,
            tranche_ratios: tranche_ratios.to_vec(),
            maturity_date,
            timestamp: now,
        });
        Ok(bond)
    }

    /// Number of bonds created so far
    pub fn bond_count(&self) -> usize {
        self.created.len()
    }

    /// Look up a created bond's address by configuration hash
    pub fn bond_address(&self, bond_id: &BondId) -> Option<Address> {
        self.created.get(bond_id).copied()
    }

    pub fn is_created(&self, bond_id: &BondId) -> bool {
        self.created.contains_key(bond_id)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }
}
