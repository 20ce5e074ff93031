//! Bond Controller Contract
//!
//! The tranching controller: owns an ordered list of tranche ledgers, the
//! collateral reference, and the deposit / early-redeem / mature state
//! machine. It is the sole authority permitted to mint or burn tranche
//! balances.
//!
//! ## Key Features
//!
//! - **Deposit**: pull collateral, mint tranches pro-rata at the current
//!   debt-to-collateral price, with optional fee accrual to the bond
//! - **Early redeem**: burn a ratio-matched basket of all tranches for a
//!   pro-rata collateral share before maturity
//! - **Mature**: run the seniority waterfall once, settle accrued fees to
//!   the administrator, and hand each tranche its collateral allotment
//! - **Skim**: sweep collateral that arrived outside the accounting model
//!   to the administrator, without confiscating elastic rebase drift
//!
//! `total_debt` is the bond's notional liability and always equals the sum
//! of all tranche supplies pre-maturity; the raw collateral balance is
//! re-read at every entry point because an elastic token can move it
//! between operations.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use tranche_common::{
    constants::{fees, limits},
    errors::{BondError, BondResult},
    events::{BondEvent, EventLog},
    math,
    types::{is_zero_address, Address},
    CollateralToken,
};
use tranche_token::TrancheLedger;

// ============================================================================
// Types
// ============================================================================

/// One entry in a bond's seniority-ordered tranche list
#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Tranche {
    pub ledger: TrancheLedger,
    /// Face-value share in parts-per-granularity
    pub ratio: u64,
}

/// Result of a successful deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositResult {
    /// Amount minted to the depositor, per tranche
    pub minted: Vec<u64>,
    /// Fee share minted to the bond itself, per tranche
    pub fees: Vec<u64>,
    /// Debt added by this deposit
    pub new_debt: u64,
    /// Extraneous collateral swept to the administrator beforehand
    pub skimmed: u64,
}

/// Result of a successful early redemption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemResult {
    /// Collateral transferred to the redeemer
    pub collateral_returned: u64,
    /// Debt removed by this redemption
    pub debt_reduced: u64,
    pub skimmed: u64,
}

/// Result of maturing the bond
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatureResult {
    /// Collateral pushed to each tranche ledger, in tranche order
    pub entitlements: Vec<u64>,
    /// Collateral paid to the administrator for accrued fee balances
    pub fee_collateral: u64,
    pub skimmed: u64,
}

// ============================================================================
// Bond Controller
// ============================================================================

/// The tranching controller for one bond.
#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct BondController {
    /// The bond's own address in the collateral token
    address: Address,
    /// Principal allowed to mature early, set fees, and receive skims/fees
    administrator: Address,
    collateral_token: Address,
    /// Seniority-ordered tranche list; the last entry is the residual
    tranches: Vec<Tranche>,
    creation_date: u64,
    maturity_date: u64,
    is_mature: bool,
    /// Notional collateral liability; equals the sum of tranche supplies
    /// while the bond is immature
    total_debt: u64,
    /// Deposit fee in basis points, settled to the administrator at maturity
    fee_bps: u64,
    /// Optional ceiling on `total_debt`; `None` means unlimited
    deposit_limit: Option<u64>,
    // Skim baseline: balance and collateral total supply recorded at the
    // end of the previous operation. A rebase moves both by the same
    // factor; a direct transfer moves only the balance.
    tracked_balance: u64,
    tracked_supply: u64,
    #[serde(skip)]
    #[borsh(skip)]
    events: EventLog,
}

impl BondController {
    /// Create a bond over an ordered tranche list.
    ///
    /// Configuration errors are rejected here, before any state exists:
    /// invalid ratio arrays, zero addresses, and a maturity date not
    /// strictly in the future.
    pub fn new(
        address: Address,
        administrator: Address,
        collateral_token: Address,
        tranches: Vec<Tranche>,
        creation_date: u64,
        maturity_date: u64,
        deposit_limit: Option<u64>,
    ) -> BondResult<Self> {
        if is_zero_address(&collateral_token) {
            return Err(BondError::InvalidAddress {
                reason: "zero collateral token address",
            });
        }
        if is_zero_address(&administrator) {
            return Err(BondError::InvalidAddress {
                reason: "zero administrator address",
            });
        }
        let ratios: Vec<u64> = tranches.iter().map(|t| t.ratio).collect();
        math::validate_tranche_ratios(&ratios)?;
        if maturity_date <= creation_date {
            return Err(BondError::InvalidMaturityDate {
                maturity_date,
                now: creation_date,
            });
        }
        Ok(Self {
            address,
            administrator,
            collateral_token,
            tranches,
            creation_date,
            maturity_date,
            is_mature: false,
            total_debt: 0,
            fee_bps: 0,
            deposit_limit,
            tracked_balance: 0,
            tracked_supply: 0,
            events: EventLog::new(),
        })
    }

    // ============ Views ============

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn administrator(&self) -> Address {
        self.administrator
    }

    pub fn collateral_token(&self) -> Address {
        self.collateral_token
    }

    pub fn tranche_count(&self) -> usize {
        self.tranches.len()
    }

    pub fn tranches(&self) -> &[Tranche] {
        &self.tranches
    }

    pub fn tranche(&self, index: usize) -> Option<&Tranche> {
        self.tranches.get(index)
    }

    /// Mutable tranche access, e.g. for post-maturity redemption calls
    /// holders make against the ledger itself.
    pub fn tranche_mut(&mut self, index: usize) -> Option<&mut Tranche> {
        self.tranches.get_mut(index)
    }

    pub fn total_debt(&self) -> u64 {
        self.total_debt
    }

    pub fn is_mature(&self) -> bool {
        self.is_mature
    }

    pub fn creation_date(&self) -> u64 {
        self.creation_date
    }

    pub fn maturity_date(&self) -> u64 {
        self.maturity_date
    }

    pub fn fee_bps(&self) -> u64 {
        self.fee_bps
    }

    pub fn deposit_limit(&self) -> Option<u64> {
        self.deposit_limit
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    // ============ Deposit ============

    /// Deposit `amount` of collateral and mint tranches to the caller.
    ///
    /// The first deposit mints `amount * ratio / granularity` per tranche.
    /// Later deposits price against the current debt-to-collateral ratio,
    /// so supply proportions stay exact under arbitrary historical
    /// rebasing. A configured fee share of each mint goes to the bond's
    /// own address instead of the caller.
    pub fn deposit<C: CollateralToken>(
        &mut self,
        token: &mut C,
        caller: &Address,
        amount: u64,
        now: u64,
    ) -> BondResult<DepositResult> {
        if self.is_mature {
            return Err(BondError::BondMature);
        }
        if amount == 0 {
            return Err(BondError::ZeroAmount);
        }

        let skimmed = self.skim(token, now)?;
        let collateral_balance = token.balance_of(&self.address);

        // Price each tranche's mint. With debt outstanding, scale the
        // ratio-implied value by debt/collateral so that one unit of
        // deposit buys claims at the current collateral-per-debt rate.
        let mut minted = Vec::with_capacity(self.tranches.len());
        let mut fee_shares = Vec::with_capacity(self.tranches.len());
        let mut new_debt: u64 = 0;
        let mut smallest_mint = u64::MAX;
        for tranche in &self.tranches {
            let mut value = math::scale_by_ratio(amount, tranche.ratio)?;
            if self.total_debt > 0 {
                if collateral_balance == 0 {
                    return Err(BondError::DivisionByZero);
                }
                value = math::mul_div(value, self.total_debt, collateral_balance)?;
            }
            smallest_mint = smallest_mint.min(value);
            new_debt = new_debt.checked_add(value).ok_or(BondError::Overflow)?;
            let (holder_share, fee_share) = math::fee_split(value, self.fee_bps)?;
            minted.push(holder_share);
            fee_shares.push(fee_share);
        }

        if self.total_debt == 0 {
            if smallest_mint < limits::MINIMUM_VALID_MINT {
                return Err(BondError::InvalidInitialDeposit {
                    smallest_mint,
                    minimum: limits::MINIMUM_VALID_MINT,
                });
            }
            // the per-tranche floor alone only implies the debt floor for
            // the smallest expressible ratio; enforce it directly
            if new_debt < limits::MINIMUM_VALID_DEBT {
                return Err(BondError::MinimumDebt {
                    remaining: new_debt,
                    minimum: limits::MINIMUM_VALID_DEBT,
                });
            }
        }
        let resulting_debt = self
            .total_debt
            .checked_add(new_debt)
            .ok_or(BondError::Overflow)?;
        if let Some(limit) = self.deposit_limit {
            if resulting_debt > limit {
                return Err(BondError::DepositLimitExceeded {
                    resulting_debt,
                    limit,
                });
            }
        }

        // Pull the collateral before minting so a failed pull leaves the
        // ledgers untouched.
        token.transfer_from(&self.address, caller, &self.address, amount)?;

        for (i, tranche) in self.tranches.iter_mut().enumerate() {
            tranche.ledger.mint(&self.address, caller, minted[i], now)?;
            if fee_shares[i] > 0 {
                tranche
                    .ledger
                    .mint(&self.address, &self.address, fee_shares[i], now)?;
            }
        }
        self.total_debt = resulting_debt;
        self.sync_baseline(token);

        self.events.emit(BondEvent::Deposit {
            depositor: *caller,
            amount,
            new_debt,
            fees: fee_shares.clone(),
            timestamp: now,
        });
        Ok(DepositResult {
            minted,
            fees: fee_shares,
            new_debt,
            skimmed,
        })
    }

    // ============ Early redeem ============

    /// Burn a ratio-matched basket of all tranches for a pro-rata share of
    /// the collateral, before maturity.
    ///
    /// `amounts` must be in exact proportion to the current tranche
    /// supplies (checked by cross-multiplication), and the debt left
    /// behind must stay at or above the minimum-valid threshold. Draining
    /// the debt to exactly zero is rejected; maturing is the only way a
    /// funded bond settles completely.
    pub fn redeem<C: CollateralToken>(
        &mut self,
        token: &mut C,
        caller: &Address,
        amounts: &[u64],
        now: u64,
    ) -> BondResult<RedeemResult> {
        if self.is_mature {
            return Err(BondError::BondMature);
        }
        if amounts.len() != self.tranches.len() {
            return Err(BondError::TrancheLengthMismatch {
                expected: self.tranches.len(),
                actual: amounts.len(),
            });
        }
        let mut total: u64 = 0;
        for &amount in amounts {
            total = total.checked_add(amount).ok_or(BondError::Overflow)?;
        }
        if total == 0 {
            return Err(BondError::ZeroAmount);
        }

        let supplies: Vec<u64> = self.tranches.iter().map(|t| t.ledger.total_supply()).collect();
        if !math::is_proportional(amounts, &supplies) {
            return Err(BondError::InvalidRedemptionRatio);
        }
        if total > self.total_debt {
            return Err(BondError::RedeemExceedsDebt {
                requested: total,
                total_debt: self.total_debt,
            });
        }
        let remaining_debt = self.total_debt - total;
        if remaining_debt < limits::MINIMUM_VALID_DEBT {
            // zero included: maturing is the only full settlement path
            return Err(BondError::MinimumDebt {
                remaining: remaining_debt,
                minimum: limits::MINIMUM_VALID_DEBT,
            });
        }
        for (i, tranche) in self.tranches.iter().enumerate() {
            let held = tranche.ledger.balance_of(caller);
            if held < amounts[i] {
                return Err(BondError::InsufficientBalance {
                    available: held,
                    requested: amounts[i],
                });
            }
        }

        let skimmed = self.skim(token, now)?;
        let collateral_balance = token.balance_of(&self.address);
        // Redeemed share of debt, priced at the current (possibly rebased)
        // collateral-per-debt rate.
        let payout = math::mul_div(total, collateral_balance, self.total_debt)?;

        let bond_address = self.address;
        for (i, tranche) in self.tranches.iter_mut().enumerate() {
            tranche.ledger.burn(&bond_address, caller, amounts[i], now)?;
        }
        self.total_debt = remaining_debt;
        token.transfer(&self.address, caller, payout)?;
        self.sync_baseline(token);

        self.events.emit(BondEvent::Redeem {
            redeemer: *caller,
            amounts: amounts.to_vec(),
            collateral_returned: payout,
            timestamp: now,
        });
        Ok(RedeemResult {
            collateral_returned: payout,
            debt_reduced: total,
            skimmed,
        })
    }

    // ============ Mature ============

    /// Run the maturity waterfall and settle the bond.
    ///
    /// The administrator may mature at any time; anyone else only once the
    /// maturity date has passed. Walks tranches from most senior to most
    /// junior, capping each at its face value; the residual tranche
    /// absorbs whatever remains, upside or downside. Accrued fee balances
    /// held by the bond are settled to the administrator at the same rate
    /// before collateral is pushed to the ledgers.
    pub fn mature<C: CollateralToken>(
        &mut self,
        token: &mut C,
        caller: &Address,
        now: u64,
    ) -> BondResult<MatureResult> {
        if self.is_mature {
            return Err(BondError::BondMature);
        }
        if caller != &self.administrator && now <= self.maturity_date {
            return Err(BondError::MaturityNotReached {
                maturity_date: self.maturity_date,
                now,
            });
        }

        let skimmed = self.skim(token, now)?;
        let collateral_balance = token.balance_of(&self.address);
        let supplies: Vec<u64> = self.tranches.iter().map(|t| t.ledger.total_supply()).collect();
        let mut entitlements = math::waterfall(collateral_balance, &supplies);

        // Settle fee balances the bond accrued to itself: redeem them at
        // the settlement rate and burn them so they take no further part
        // in holder redemptions.
        let bond_address = self.address;
        let mut fee_collateral: u64 = 0;
        for (i, tranche) in self.tranches.iter_mut().enumerate() {
            let fee_balance = tranche.ledger.balance_of(&bond_address);
            if fee_balance == 0 {
                continue;
            }
            let fee_share = math::mul_div(entitlements[i], fee_balance, supplies[i])?;
            tranche.ledger.burn(&bond_address, &bond_address, fee_balance, now)?;
            entitlements[i] -= fee_share;
            fee_collateral = fee_collateral
                .checked_add(fee_share)
                .ok_or(BondError::Overflow)?;
        }
        if fee_collateral > 0 {
            token.transfer(&self.address, &self.administrator, fee_collateral)?;
        }

        for (i, tranche) in self.tranches.iter_mut().enumerate() {
            token.transfer(&bond_address, &tranche.ledger.address(), entitlements[i])?;
            tranche.ledger.mark_matured(&bond_address)?;
        }

        self.is_mature = true;
        self.total_debt = 0;
        self.sync_baseline(token);

        self.events.emit(BondEvent::Mature {
            caller: *caller,
            entitlements: entitlements.clone(),
            fee_collateral,
            timestamp: now,
        });
        Ok(MatureResult {
            entitlements,
            fee_collateral,
            skimmed,
        })
    }

    // ============ Administration ============

    /// Set the deposit fee. Administrator only; capped at
    /// [`fees::MAX_FEE_BPS`].
    pub fn set_fee(&mut self, caller: &Address, fee_bps: u64, now: u64) -> BondResult<()> {
        self.require_administrator(caller)?;
        if self.is_mature {
            return Err(BondError::BondMature);
        }
        if fee_bps > fees::MAX_FEE_BPS {
            return Err(BondError::InvalidFee {
                fee_bps,
                max: fees::MAX_FEE_BPS,
            });
        }
        let old_fee_bps = self.fee_bps;
        self.fee_bps = fee_bps;
        self.events.emit(BondEvent::FeeUpdated {
            old_fee_bps,
            new_fee_bps: fee_bps,
            timestamp: now,
        });
        Ok(())
    }

    /// Set or clear the deposit limit. Administrator only.
    pub fn set_deposit_limit(
        &mut self,
        caller: &Address,
        limit: Option<u64>,
        now: u64,
    ) -> BondResult<()> {
        self.require_administrator(caller)?;
        let old_limit = self.deposit_limit;
        self.deposit_limit = limit;
        self.events.emit(BondEvent::DepositLimitUpdated {
            old_limit,
            new_limit: limit,
            timestamp: now,
        });
        Ok(())
    }

    // ============ Internals ============

    fn require_administrator(&self, caller: &Address) -> BondResult<()> {
        if caller != &self.administrator {
            return Err(BondError::Unauthorized {
                expected: self.administrator,
                actual: *caller,
            });
        }
        Ok(())
    }

    /// Sweep collateral that arrived outside the accounting model to the
    /// administrator.
    ///
    /// The expected balance is the balance recorded after the previous
    /// operation, scaled by the collateral's total-supply ratio since
    /// then: a rebase moves every balance and the total supply together,
    /// so rebase drift stays with the tranche holders, while a direct
    /// transfer moves only the bond's balance and is swept.
    fn skim<C: CollateralToken>(&mut self, token: &mut C, now: u64) -> BondResult<u64> {
        let actual = token.balance_of(&self.address);
        let supply = token.total_supply();
        let expected = if self.tracked_supply == 0 {
            0
        } else {
            math::mul_div(self.tracked_balance, supply, self.tracked_supply)?
        };
        let surplus = actual.saturating_sub(expected);
        if surplus > 0 {
            token.transfer(&self.address, &self.administrator, surplus)?;
            self.events.emit(BondEvent::CollateralSkimmed {
                to: self.administrator,
                amount: surplus,
                timestamp: now,
            });
        }
        self.tracked_balance = actual - surplus;
        self.tracked_supply = supply;
        Ok(surplus)
    }

    fn sync_baseline<C: CollateralToken>(&mut self, token: &C) {
        self.tracked_balance = token.balance_of(&self.address);
        self.tracked_supply = token.total_supply();
    }
}
