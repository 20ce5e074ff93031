//! Tranche Ledger Contract
//!
//! A fungible balance ledger bound permanently to exactly one bond at
//! creation. The owning bond is the only principal allowed to mint and
//! burn; holders may transfer freely.
//!
//! After the bond matures it pushes this tranche's collateral entitlement
//! to the ledger's own address and flips the `matured` flag; from then on
//! holders redeem directly against the ledger's collateral holdings, with
//! no further involvement of the bond or the other tranches.

use std::collections::BTreeMap;
use std::string::String;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use tranche_common::{
    errors::{BondError, BondResult},
    events::{BondEvent, EventLog},
    types::Address,
    CollateralToken,
};

/// One tranche's fungible claim ledger.
#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TrancheLedger {
    /// This ledger's own address (collateral is held under it post-maturity)
    address: Address,
    /// The owning bond; the only principal allowed to mint/burn
    bond: Address,
    /// The collateral token this tranche ultimately settles in
    collateral_token: Address,
    name: String,
    symbol: String,
    /// Inherited from the collateral token at creation for unit consistency
    decimals: u8,
    balances: BTreeMap<Address, u64>,
    total_supply: u64,
    /// One-way flag set by the bond at maturity
    matured: bool,
    #[serde(skip)]
    #[borsh(skip)]
    events: EventLog,
}

impl TrancheLedger {
    /// Create a new ledger bound to `bond`. Called by the factory as part
    /// of atomic bond creation.
    pub fn new(
        address: Address,
        bond: Address,
        collateral_token: Address,
        name: String,
        symbol: String,
        decimals: u8,
    ) -> Self {
        Self {
            address,
            bond,
            collateral_token,
            name,
            symbol,
            decimals,
            balances: BTreeMap::new(),
            total_supply: 0,
            matured: false,
            events: EventLog::new(),
        }
    }

    // ============ Views ============

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn bond(&self) -> Address {
        self.bond
    }

    pub fn collateral_token(&self) -> Address {
        self.collateral_token
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn is_matured(&self) -> bool {
        self.matured
    }

    /// Events emitted by this ledger
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    // ============ Bond-only operations ============

    /// Mint `amount` to `to`. Only the owning bond may call.
    pub fn mint(&mut self, caller: &Address, to: &Address, amount: u64, now: u64) -> BondResult<()> {
        self.require_bond(caller)?;
        let balance = self.balances.entry(*to).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(BondError::Overflow)?;
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(BondError::Overflow)?;
        self.events.emit(BondEvent::TokenMint {
            to: *to,
            amount,
            new_total_supply: self.total_supply,
            timestamp: now,
        });
        Ok(())
    }

    /// Burn `amount` from `from`. Only the owning bond may call.
    pub fn burn(&mut self, caller: &Address, from: &Address, amount: u64, now: u64) -> BondResult<()> {
        self.require_bond(caller)?;
        self.burn_internal(from, amount)?;
        self.events.emit(BondEvent::TokenBurn {
            from: *from,
            amount,
            new_total_supply: self.total_supply,
            timestamp: now,
        });
        Ok(())
    }

    /// Flip the one-way maturity flag. Only the owning bond may call.
    pub fn mark_matured(&mut self, caller: &Address) -> BondResult<()> {
        self.require_bond(caller)?;
        self.matured = true;
        Ok(())
    }

    // ============ Holder operations ============

    /// Move `amount` from `from` to `to`.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u64, now: u64) -> BondResult<()> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(BondError::InsufficientBalance {
                available: from_balance,
                requested: amount,
            });
        }
        if from != to && amount > 0 {
            self.balances.insert(*from, from_balance - amount);
            let to_balance = self.balance_of(to);
            self.balances
                .insert(*to, to_balance.checked_add(amount).ok_or(BondError::Overflow)?);
            self.events.emit(BondEvent::TokenTransfer {
                from: *from,
                to: *to,
                amount,
                timestamp: now,
            });
        }
        Ok(())
    }

    /// Redeem matured tranches for a pro-rata share of this ledger's own
    /// collateral holdings.
    ///
    /// Pays `collateral_held * amount / total_supply` (floor), measured
    /// before the burn. Safe to call repeatedly by different holders in
    /// any order; collateral transferred into the ledger after maturity is
    /// simply distributed pro-rata among the remaining holders.
    pub fn redeem_mature<C: CollateralToken>(
        &mut self,
        token: &mut C,
        caller: &Address,
        amount: u64,
        now: u64,
    ) -> BondResult<u64> {
        if !self.matured {
            return Err(BondError::BondImmature);
        }
        if amount == 0 {
            return Err(BondError::ZeroAmount);
        }
        let supply_before = self.total_supply;
        if supply_before == 0 {
            return Err(BondError::InsufficientBalance {
                available: 0,
                requested: amount,
            });
        }

        let collateral_held = token.balance_of(&self.address);
        let payout = (collateral_held as u128)
            .checked_mul(amount as u128)
            .ok_or(BondError::Overflow)?
            / (supply_before as u128);
        let payout = u64::try_from(payout).map_err(|_| BondError::Overflow)?;

        self.burn_internal(caller, amount)?;
        token.transfer(&self.address, caller, payout)?;

        self.events.emit(BondEvent::MatureRedemption {
            holder: *caller,
            burned: amount,
            collateral_returned: payout,
            timestamp: now,
        });
        Ok(payout)
    }

    // ============ Internals ============

    fn require_bond(&self, caller: &Address) -> BondResult<()> {
        if caller != &self.bond {
            return Err(BondError::NotBond { caller: *caller });
        }
        Ok(())
    }

    fn burn_internal(&mut self, from: &Address, amount: u64) -> BondResult<()> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(BondError::InsufficientBalance {
                available: balance,
                requested: amount,
            });
        }
        self.balances.insert(*from, balance - amount);
        self.total_supply -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tranche_common::ElasticToken;

    const BOND: Address = [10u8; 32];
    const LEDGER: Address = [11u8; 32];
    const COLLATERAL: Address = [12u8; 32];
    const HOLDER: Address = [1u8; 32];
    const OTHER: Address = [2u8; 32];

    fn ledger() -> TrancheLedger {
        TrancheLedger::new(
            LEDGER,
            BOND,
            COLLATERAL,
            String::from("Tranche AMPL A"),
            String::from("TRANCHE-AMPL-A"),
            9,
        )
    }

    #[test]
    fn test_initialization() {
        let ledger = ledger();
        assert_eq!(ledger.bond(), BOND);
        assert_eq!(ledger.collateral_token(), COLLATERAL);
        assert_eq!(ledger.name(), "Tranche AMPL A");
        assert_eq!(ledger.symbol(), "TRANCHE-AMPL-A");
        assert_eq!(ledger.decimals(), 9);
        assert_eq!(ledger.total_supply(), 0);
        assert!(!ledger.is_matured());
    }

    #[test]
    fn test_mint_by_bond() {
        let mut ledger = ledger();
        ledger.mint(&BOND, &HOLDER, 100, 1).unwrap();
        assert_eq!(ledger.balance_of(&HOLDER), 100);
        assert_eq!(ledger.total_supply(), 100);
    }

    #[test]
    fn test_mint_rejected_from_non_bond() {
        let mut ledger = ledger();
        let err = ledger.mint(&OTHER, &OTHER, 100, 1).unwrap_err();
        assert_eq!(err, BondError::NotBond { caller: OTHER });
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn test_burn_partial_and_full() {
        let mut ledger = ledger();
        ledger.mint(&BOND, &HOLDER, 100, 1).unwrap();

        ledger.burn(&BOND, &HOLDER, 50, 2).unwrap();
        assert_eq!(ledger.balance_of(&HOLDER), 50);

        ledger.burn(&BOND, &HOLDER, 50, 3).unwrap();
        assert_eq!(ledger.balance_of(&HOLDER), 0);
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn test_burn_more_than_balance() {
        let mut ledger = ledger();
        ledger.mint(&BOND, &HOLDER, 100, 1).unwrap();
        let err = ledger.burn(&BOND, &HOLDER, 200, 2).unwrap_err();
        assert_eq!(
            err,
            BondError::InsufficientBalance {
                available: 100,
                requested: 200
            }
        );
    }

    #[test]
    fn test_burn_rejected_from_non_bond() {
        let mut ledger = ledger();
        ledger.mint(&BOND, &HOLDER, 100, 1).unwrap();
        let err = ledger.burn(&OTHER, &HOLDER, 100, 2).unwrap_err();
        assert_eq!(err, BondError::NotBond { caller: OTHER });
    }

    #[test]
    fn test_transfer_between_holders() {
        let mut ledger = ledger();
        ledger.mint(&BOND, &HOLDER, 100, 1).unwrap();
        ledger.transfer(&HOLDER, &OTHER, 40, 2).unwrap();
        assert_eq!(ledger.balance_of(&HOLDER), 60);
        assert_eq!(ledger.balance_of(&OTHER), 40);
        assert_eq!(ledger.total_supply(), 100);
    }

    #[test]
    fn test_noop_transfers_emit_nothing() {
        let mut ledger = ledger();
        ledger.mint(&BOND, &HOLDER, 100, 1).unwrap();
        let events_before = ledger.events().len();

        ledger.transfer(&HOLDER, &OTHER, 0, 2).unwrap();
        ledger.transfer(&HOLDER, &HOLDER, 50, 2).unwrap();
        assert_eq!(ledger.events().len(), events_before);
        assert_eq!(ledger.balance_of(&HOLDER), 100);

        // balances are still checked even for a self-transfer
        let err = ledger.transfer(&HOLDER, &HOLDER, 200, 3).unwrap_err();
        assert_eq!(
            err,
            BondError::InsufficientBalance {
                available: 100,
                requested: 200
            }
        );
    }

    #[test]
    fn test_redeem_mature_requires_maturity() {
        let mut ledger = ledger();
        let mut token = ElasticToken::new(COLLATERAL, "AMPL", 9);
        ledger.mint(&BOND, &HOLDER, 100, 1).unwrap();
        let err = ledger
            .redeem_mature(&mut token, &HOLDER, 100, 2)
            .unwrap_err();
        assert_eq!(err, BondError::BondImmature);
    }

    #[test]
    fn test_redeem_mature_pro_rata() {
        let mut ledger = ledger();
        let mut token = ElasticToken::new(COLLATERAL, "AMPL", 9);
        ledger.mint(&BOND, &HOLDER, 100, 1).unwrap();
        token.mint(&LEDGER, 100).unwrap();
        ledger.mark_matured(&BOND).unwrap();

        let payout = ledger.redeem_mature(&mut token, &HOLDER, 50, 2).unwrap();
        assert_eq!(payout, 50);
        assert_eq!(ledger.balance_of(&HOLDER), 50);
        assert_eq!(token.balance_of(&HOLDER), 50);
        assert_eq!(token.balance_of(&LEDGER), 50);
    }

    #[test]
    fn test_redeem_mature_with_surplus_collateral() {
        // the ledger holds more collateral than its nominal supply;
        // redeeming the full balance drains it completely
        let mut ledger = ledger();
        let mut token = ElasticToken::new(COLLATERAL, "AMPL", 9);
        ledger.mint(&BOND, &HOLDER, 100, 1).unwrap();
        token.mint(&LEDGER, 200).unwrap();
        ledger.mark_matured(&BOND).unwrap();

        let payout = ledger.redeem_mature(&mut token, &HOLDER, 100, 2).unwrap();
        assert_eq!(payout, 200);
        assert_eq!(token.balance_of(&LEDGER), 0);
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn test_redeem_mature_sequential_holders() {
        let mut ledger = ledger();
        let mut token = ElasticToken::new(COLLATERAL, "AMPL", 9);
        ledger.mint(&BOND, &HOLDER, 60, 1).unwrap();
        ledger.mint(&BOND, &OTHER, 40, 1).unwrap();
        token.mint(&LEDGER, 500).unwrap();
        ledger.mark_matured(&BOND).unwrap();

        let first = ledger.redeem_mature(&mut token, &HOLDER, 60, 2).unwrap();
        assert_eq!(first, 300);
        // remaining holder gets the remaining collateral
        let second = ledger.redeem_mature(&mut token, &OTHER, 40, 3).unwrap();
        assert_eq!(second, 200);
        assert_eq!(token.balance_of(&LEDGER), 0);
    }

    #[test]
    fn test_redeem_mature_more_than_balance() {
        let mut ledger = ledger();
        let mut token = ElasticToken::new(COLLATERAL, "AMPL", 9);
        ledger.mint(&BOND, &HOLDER, 100, 1).unwrap();
        token.mint(&LEDGER, 100).unwrap();
        ledger.mark_matured(&BOND).unwrap();

        let err = ledger
            .redeem_mature(&mut token, &HOLDER, 200, 2)
            .unwrap_err();
        assert_eq!(
            err,
            BondError::InsufficientBalance {
                available: 100,
                requested: 200
            }
        );
        // nothing moved
        assert_eq!(token.balance_of(&LEDGER), 100);
        assert_eq!(ledger.balance_of(&HOLDER), 100);
    }

    #[test]
    fn test_events_emitted() {
        let mut ledger = ledger();
        ledger.mint(&BOND, &HOLDER, 100, 1).unwrap();
        ledger.transfer(&HOLDER, &OTHER, 10, 2).unwrap();
        ledger.burn(&BOND, &OTHER, 10, 3).unwrap();
        assert_eq!(ledger.events().len(), 3);
    }
}
