//! Fixed-Point Ratio and Waterfall Math
//!
//! All ratio math is integer arithmetic against a fixed granularity to
//! avoid floating-point non-determinism. Intermediates are widened to
//! u128; divisions floor. Rounding loss at tranche boundaries is bounded
//! by the minimum-valid-amount thresholds enforced at the entry points.

use crate::constants::{fees, ratios};
use crate::errors::{BondError, BondResult};
use crate::Vec;

/// floor(a * b / c) with checked widening.
pub fn mul_div(a: u64, b: u64, c: u64) -> BondResult<u64> {
    if c == 0 {
        return Err(BondError::DivisionByZero);
    }
    let wide = (a as u128)
        .checked_mul(b as u128)
        .ok_or(BondError::Overflow)?
        / (c as u128);
    u64::try_from(wide).map_err(|_| BondError::Overflow)
}

/// The portion of `amount` belonging to a tranche with the given ratio.
pub fn scale_by_ratio(amount: u64, ratio: u64) -> BondResult<u64> {
    mul_div(amount, ratio, ratios::TRANCHE_RATIO_GRANULARITY)
}

/// Split a tranche mint into (holder share, fee share).
///
/// The fee share is minted to the bond itself and settled to the
/// administrator at maturity.
pub fn fee_split(value: u64, fee_bps: u64) -> BondResult<(u64, u64)> {
    let fee = mul_div(value, fee_bps, fees::BPS_DENOMINATOR)?;
    Ok((value - fee, fee))
}

/// Validate a tranche ratio array at bond creation.
///
/// Requires 1..=MAX_TRANCHE_COUNT entries, each strictly between 0 and the
/// granularity, summing exactly to the granularity. A single tranche
/// taking the whole granularity is rejected along with everything else
/// that fails the strict per-ratio bound.
pub fn validate_tranche_ratios(tranche_ratios: &[u64]) -> BondResult<()> {
    if tranche_ratios.is_empty() {
        return Err(BondError::NoTranches);
    }
    if tranche_ratios.len() > ratios::MAX_TRANCHE_COUNT {
        return Err(BondError::TooManyTranches {
            count: tranche_ratios.len(),
        });
    }

    let mut total: u64 = 0;
    for &ratio in tranche_ratios {
        if ratio == 0 || ratio >= ratios::TRANCHE_RATIO_GRANULARITY {
            return Err(BondError::InvalidTrancheRatio { ratio });
        }
        total = total.checked_add(ratio).ok_or(BondError::Overflow)?;
    }
    if total != ratios::TRANCHE_RATIO_GRANULARITY {
        return Err(BondError::InvalidTotalRatio { total });
    }
    Ok(())
}

/// Check that `amounts` are in exact proportion to `supplies`.
///
/// Expressed via cross-multiplication to avoid floating error:
/// `amounts[i] * supplies[0] == amounts[0] * supplies[i]` for all `i`.
pub fn is_proportional(amounts: &[u64], supplies: &[u64]) -> bool {
    if amounts.len() != supplies.len() || amounts.is_empty() {
        return false;
    }
    let a0 = amounts[0] as u128;
    let s0 = supplies[0] as u128;
    for i in 1..amounts.len() {
        if (amounts[i] as u128) * s0 != a0 * (supplies[i] as u128) {
            return false;
        }
    }
    true
}

/// Seniority waterfall run once, at maturity.
///
/// Walks tranches from most senior to most junior: each non-final tranche
/// is entitled to `min(remaining, supply)` (a 1:1 face-value claim capped
/// by supply); the final residual tranche receives whatever collateral
/// remains, which may be below or above its nominal supply.
pub fn waterfall(collateral: u64, supplies: &[u64]) -> Vec<u64> {
    let mut entitlements = Vec::with_capacity(supplies.len());
    if supplies.is_empty() {
        return entitlements;
    }
    let mut remaining = collateral;
    for &supply in &supplies[..supplies.len() - 1] {
        let entitlement = remaining.min(supply);
        remaining -= entitlement;
        entitlements.push(entitlement);
    }
    entitlements.push(remaining);
    entitlements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_floors() {
        assert_eq!(mul_div(7, 3, 2).unwrap(), 10);
        assert_eq!(mul_div(1, 1, 3).unwrap(), 0);
        assert_eq!(mul_div(u64::MAX, u64::MAX, u64::MAX).unwrap(), u64::MAX);
    }

    #[test]
    fn test_mul_div_errors() {
        assert_eq!(mul_div(1, 1, 0), Err(BondError::DivisionByZero));
        assert_eq!(mul_div(u64::MAX, 2, 1), Err(BondError::Overflow));
    }

    #[test]
    fn test_scale_by_ratio() {
        assert_eq!(scale_by_ratio(1000, 200).unwrap(), 200);
        assert_eq!(scale_by_ratio(1000, 500).unwrap(), 500);
        // floors at the granularity boundary
        assert_eq!(scale_by_ratio(999, 1).unwrap(), 0);
    }

    #[test]
    fn test_fee_split() {
        // 5 bps on a 200-unit mint: 0.01% of 200 floors to 0 at small scale
        assert_eq!(fee_split(200, 5).unwrap(), (200, 0));
        // at protocol scale the fee is visible
        let (holder, fee) = fee_split(200_000_000_000, 5).unwrap();
        assert_eq!(fee, 100_000_000);
        assert_eq!(holder, 199_900_000_000);
    }

    #[test]
    fn test_validate_ratios_accepts_canonical() {
        validate_tranche_ratios(&[200, 300, 500]).unwrap();
        validate_tranche_ratios(&[100, 200, 200, 500]).unwrap();
        validate_tranche_ratios(&[500, 500]).unwrap();
    }

    #[test]
    fn test_validate_ratios_rejects_bad_arrays() {
        assert_eq!(validate_tranche_ratios(&[]), Err(BondError::NoTranches));
        assert_eq!(
            validate_tranche_ratios(&[10, 20]),
            Err(BondError::InvalidTotalRatio { total: 30 })
        );
        assert_eq!(
            validate_tranche_ratios(&[1005]),
            Err(BondError::InvalidTrancheRatio { ratio: 1005 })
        );
        assert_eq!(
            validate_tranche_ratios(&[400, 500, 900]),
            Err(BondError::InvalidTotalRatio { total: 1800 })
        );
        // the whole granularity in one tranche is rejected
        assert_eq!(
            validate_tranche_ratios(&[1000]),
            Err(BondError::InvalidTrancheRatio { ratio: 1000 })
        );
        assert_eq!(
            validate_tranche_ratios(&[1u64; 27]),
            Err(BondError::TooManyTranches { count: 27 })
        );
    }

    #[test]
    fn test_proportionality() {
        assert!(is_proportional(&[20, 30, 50], &[200, 300, 500]));
        assert!(is_proportional(&[0, 0, 0], &[200, 300, 500]));
        assert!(!is_proportional(&[20, 30, 51], &[200, 300, 500]));
        assert!(!is_proportional(&[20, 30], &[200, 300, 500]));
        // zero supply requires a zero amount
        assert!(!is_proportional(&[10, 1], &[100, 0]));
        assert!(is_proportional(&[10, 0], &[100, 0]));
    }

    #[test]
    fn test_waterfall_full_coverage() {
        assert_eq!(waterfall(1000, &[200, 300, 500]), [200, 300, 500]);
    }

    #[test]
    fn test_waterfall_shortfall_hits_junior_first() {
        // collateral cut in half: A and B whole, Z wiped out
        assert_eq!(waterfall(500, &[200, 300, 500]), [200, 300, 0]);
        // deeper loss eats into B
        assert_eq!(waterfall(350, &[200, 300, 500]), [200, 150, 0]);
        // total loss
        assert_eq!(waterfall(0, &[200, 300, 500]), [0, 0, 0]);
    }

    #[test]
    fn test_waterfall_surplus_goes_to_junior() {
        assert_eq!(waterfall(1500, &[200, 300, 500]), [200, 300, 1000]);
    }

    #[test]
    fn test_waterfall_conserves_collateral() {
        for collateral in [0u64, 1, 350, 500, 1000, 1500, 10_000] {
            let entitlements = waterfall(collateral, &[200, 300, 500]);
            assert_eq!(entitlements.iter().sum::<u64>(), collateral);
        }
    }
}
