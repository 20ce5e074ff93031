//! Protocol Constants
//!
//! All magic numbers and configuration values for the tranche protocol.
//! Ratio math is integer-only against a fixed granularity so that every
//! deployment of the engine computes identical results.

/// Tranche ratio configuration
pub mod ratios {
    /// Denominator of all tranche ratios (parts-per-thousand).
    /// Every bond's ratios must sum to exactly this value.
    pub const TRANCHE_RATIO_GRANULARITY: u64 = 1000;

    /// Maximum number of tranches per bond (one letter per tranche, A-Z)
    pub const MAX_TRANCHE_COUNT: usize = 26;
}

/// Fee Configuration (in basis points, 100 = 1%)
pub mod fees {
    /// Maximum deposit fee the administrator may configure (0.5%)
    pub const MAX_FEE_BPS: u64 = 50;

    /// Basis points denominator
    pub const BPS_DENOMINATOR: u64 = 10_000;
}

/// Debt Limits
pub mod limits {
    use super::ratios::TRANCHE_RATIO_GRANULARITY;

    /// Minimum non-zero `total_debt` a bond may hold.
    ///
    /// Tranche mint/redeem arithmetic divides by `total_debt`; a tiny
    /// outstanding debt would amplify rounding error in every subsequent
    /// pro-rata computation, so deposits and redemptions that would leave
    /// `0 < total_debt < MINIMUM_VALID_DEBT` are rejected.
    pub const MINIMUM_VALID_DEBT: u64 = 1_000_000_000;

    /// Minimum amount any single tranche may receive on the first deposit.
    /// Bounds rounding loss at the tranche ratio boundaries.
    pub const MINIMUM_VALID_MINT: u64 = MINIMUM_VALID_DEBT / TRANCHE_RATIO_GRANULARITY;
}

/// Tranche naming
pub mod labels {
    /// Letters assigned to tranches in seniority order. The final tranche
    /// of a bond is always labeled "Z" regardless of count.
    pub const TRANCHE_LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    /// Letter of the residual (most junior) tranche
    pub const RESIDUAL_LETTER: char = 'Z';
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_mint_consistent_with_minimum_debt() {
        // A first deposit of exactly MINIMUM_VALID_DEBT with the smallest
        // expressible ratio (1/1000) must clear the per-tranche minimum.
        assert_eq!(
            limits::MINIMUM_VALID_MINT,
            limits::MINIMUM_VALID_DEBT / ratios::TRANCHE_RATIO_GRANULARITY
        );
        assert!(limits::MINIMUM_VALID_MINT > 0);
    }

    #[test]
    fn test_fee_cap_below_denominator() {
        assert!(fees::MAX_FEE_BPS < fees::BPS_DENOMINATOR);
    }
}
