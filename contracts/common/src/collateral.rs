//! Collateral Token Abstraction
//!
//! The engine treats collateral as any fungible balance with ERC20-style
//! pull/push semantics, and treats the token's reported balances as ground
//! truth: an *elastic* (rebasing) token may change every holder's balance
//! without a transfer, driven by a process the engine does not control.
//!
//! `ElasticToken` is the reference implementation used by the test suites
//! and exercises exactly that behavior via `rebase`.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{BondError, BondResult};
use crate::types::{is_zero_address, Address};
use crate::{BTreeMap, String};

/// Fungible collateral interface the bond controller operates against.
///
/// Transfers are synchronous: they either complete or fail with a typed
/// error, aborting the enclosing operation.
pub trait CollateralToken {
    /// The token's own address
    fn address(&self) -> Address;

    /// Token symbol, used for tranche naming at creation
    fn symbol(&self) -> &str;

    /// Decimal places; tranche ledgers inherit this at creation
    fn decimals(&self) -> u8;

    /// Total supply as currently reported (moves on rebase)
    fn total_supply(&self) -> u64;

    /// Reported balance of `owner`
    fn balance_of(&self, owner: &Address) -> u64;

    /// Move `amount` from `from` to `to`
    fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> BondResult<()>;

    /// Let `spender` pull up to `amount` from `owner`
    fn approve(&mut self, owner: &Address, spender: &Address, amount: u64);

    /// Remaining pull-approval from `owner` to `spender`
    fn allowance(&self, owner: &Address, spender: &Address) -> u64;

    /// Pull `amount` from `from` to `to` on behalf of `spender`
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> BondResult<()>;
}

/// Creation-time metadata snapshot of a collateral token.
///
/// The factory and periodic minter work from stored collateral addresses;
/// off-chain there is no host to dereference an address into a live token,
/// so the metadata needed for naming and unit consistency travels in this
/// struct instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CollateralSpec {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl CollateralSpec {
    /// Snapshot the metadata of a live token
    pub fn of<C: CollateralToken>(token: &C) -> Self {
        Self {
            address: token.address(),
            symbol: String::from(token.symbol()),
            decimals: token.decimals(),
        }
    }
}

/// Reference elastic (rebasing) collateral token.
///
/// Balances are plain integers; `rebase` rescales every holder's balance
/// and the total supply by the same factor, the way AMPL-style supply
/// adjustments do. Flooring happens per holder, so the total supply is
/// always the exact sum of balances.
#[derive(Debug, Clone)]
pub struct ElasticToken {
    address: Address,
    symbol: String,
    decimals: u8,
    balances: BTreeMap<Address, u64>,
    allowances: BTreeMap<(Address, Address), u64>,
    total_supply: u64,
}

impl ElasticToken {
    pub fn new(address: Address, symbol: &str, decimals: u8) -> Self {
        Self {
            address,
            symbol: String::from(symbol),
            decimals,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            total_supply: 0,
        }
    }

    /// Create supply out of thin air. Stands in for whatever issuance the
    /// real collateral has; used by tests and fixtures.
    pub fn mint(&mut self, to: &Address, amount: u64) -> BondResult<()> {
        let balance = self.balances.entry(*to).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(BondError::Overflow)?;
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(BondError::Overflow)?;
        Ok(())
    }

    /// Rescale every balance by `numerator / denominator`.
    ///
    /// A rebase moves all balances and the total supply by the same factor
    /// without any transfer; holders' relative shares are preserved up to
    /// per-holder flooring.
    pub fn rebase(&mut self, numerator: u64, denominator: u64) -> BondResult<()> {
        if denominator == 0 {
            return Err(BondError::DivisionByZero);
        }
        let mut new_total: u64 = 0;
        for balance in self.balances.values_mut() {
            let scaled = (*balance as u128)
                .checked_mul(numerator as u128)
                .ok_or(BondError::Overflow)?
                / (denominator as u128);
            *balance = u64::try_from(scaled).map_err(|_| BondError::Overflow)?;
            new_total = new_total
                .checked_add(*balance)
                .ok_or(BondError::Overflow)?;
        }
        self.total_supply = new_total;
        Ok(())
    }
}

impl CollateralToken for ElasticToken {
    fn address(&self) -> Address {
        self.address
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn total_supply(&self) -> u64 {
        self.total_supply
    }

    fn balance_of(&self, owner: &Address) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> BondResult<()> {
        if is_zero_address(to) {
            return Err(BondError::InvalidAddress {
                reason: "transfer to the zero address",
            });
        }
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(BondError::InsufficientBalance {
                available: from_balance,
                requested: amount,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        self.balances.insert(*from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances
            .insert(*to, to_balance.checked_add(amount).ok_or(BondError::Overflow)?);
        Ok(())
    }

    fn approve(&mut self, owner: &Address, spender: &Address, amount: u64) {
        self.allowances.insert((*owner, *spender), amount);
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> BondResult<()> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(BondError::InsufficientAllowance {
                allowance: allowed,
                requested: amount,
            });
        }
        self.transfer(from, to, amount)?;
        self.allowances.insert((*from, *spender), allowed - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: Address = [1u8; 32];
    const BOB: Address = [2u8; 32];
    const CAROL: Address = [3u8; 32];

    fn token() -> ElasticToken {
        let mut token = ElasticToken::new([9u8; 32], "AMPL", 9);
        token.mint(&ALICE, 1000).unwrap();
        token
    }

    #[test]
    fn test_transfer_moves_balances() {
        let mut token = token();
        token.transfer(&ALICE, &BOB, 400).unwrap();
        assert_eq!(token.balance_of(&ALICE), 600);
        assert_eq!(token.balance_of(&BOB), 400);
        assert_eq!(token.total_supply(), 1000);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut token = token();
        let err = token.transfer(&ALICE, &BOB, 1001).unwrap_err();
        assert_eq!(
            err,
            BondError::InsufficientBalance {
                available: 1000,
                requested: 1001
            }
        );
        assert_eq!(token.balance_of(&ALICE), 1000);
    }

    #[test]
    fn test_transfer_from_requires_allowance() {
        let mut token = token();
        let err = token.transfer_from(&CAROL, &ALICE, &BOB, 100).unwrap_err();
        assert_eq!(
            err,
            BondError::InsufficientAllowance {
                allowance: 0,
                requested: 100
            }
        );

        token.approve(&ALICE, &CAROL, 150);
        token.transfer_from(&CAROL, &ALICE, &BOB, 100).unwrap();
        assert_eq!(token.balance_of(&BOB), 100);
        assert_eq!(token.allowance(&ALICE, &CAROL), 50);
    }

    #[test]
    fn test_rebase_up_scales_all_holders() {
        let mut token = token();
        token.transfer(&ALICE, &BOB, 400).unwrap();
        token.rebase(2, 1).unwrap();
        assert_eq!(token.balance_of(&ALICE), 1200);
        assert_eq!(token.balance_of(&BOB), 800);
        assert_eq!(token.total_supply(), 2000);
    }

    #[test]
    fn test_rebase_down_floors_per_holder() {
        let mut token = token();
        token.transfer(&ALICE, &BOB, 333).unwrap();
        token.rebase(1, 2).unwrap();
        assert_eq!(token.balance_of(&ALICE), 333); // floor(667/2)
        assert_eq!(token.balance_of(&BOB), 166); // floor(333/2)
        assert_eq!(token.total_supply(), 499);
    }

    #[test]
    fn test_rebase_preserves_allowances() {
        let mut token = token();
        token.approve(&ALICE, &BOB, 500);
        token.rebase(3, 1).unwrap();
        assert_eq!(token.allowance(&ALICE, &BOB), 500);
    }
}
