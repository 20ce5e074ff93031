//! Error Types for the Tranche Protocol
//!
//! Typed errors with enough context to debug a rejected operation from the
//! error value alone. Every failure aborts the enclosing operation as a
//! whole; no partial state change survives an `Err`.

/// Result type alias for tranche protocol operations
pub type BondResult<T> = Result<T, BondError>;

/// Main error enum for all tranche protocol errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BondError {
    // ============ Configuration Errors ============
    /// A single tranche ratio is outside (0, granularity)
    InvalidTrancheRatio { ratio: u64 },

    /// Tranche ratios do not sum to the granularity
    InvalidTotalRatio { total: u64 },

    /// More tranches than the protocol supports
    TooManyTranches { count: usize },

    /// A bond needs at least one tranche
    NoTranches,

    /// Maturity date is not strictly in the future at creation
    InvalidMaturityDate { maturity_date: u64, now: u64 },

    /// Invalid address (e.g., the zero address)
    InvalidAddress {
        /// Description of why the address is invalid
        reason: &'static str,
    },

    /// A bond with this exact configuration already exists
    BondAlreadyExists { bond_id: [u8; 32] },

    /// Fee exceeds the protocol cap
    InvalidFee { fee_bps: u64, max: u64 },

    // ============ Guard Violations ============
    /// Operation requires an immature bond
    BondMature,

    /// Bond cannot be matured yet by this caller
    MaturityNotReached { maturity_date: u64, now: u64 },

    /// Operation requires a matured bond
    BondImmature,

    /// Zero amount not allowed
    ZeroAmount,

    /// Deposit would push total debt over the configured limit
    DepositLimitExceeded { resulting_debt: u64, limit: u64 },

    /// First deposit too small to mint every tranche safely
    InvalidInitialDeposit { smallest_mint: u64, minimum: u64 },

    /// Redemption amounts array length does not match the tranche count
    TrancheLengthMismatch { expected: usize, actual: usize },

    /// Redemption amounts are not proportional to tranche supplies
    InvalidRedemptionRatio,

    /// Operation would leave a nonzero total debt below the minimum
    MinimumDebt { remaining: u64, minimum: u64 },

    /// Redemption exceeds the bond's outstanding debt
    RedeemExceedsDebt { requested: u64, total_debt: u64 },

    // ============ Collateral Collaborator Errors ============
    /// Insufficient balance for a transfer or burn
    InsufficientBalance { available: u64, requested: u64 },

    /// Insufficient allowance for a collateral pull
    InsufficientAllowance { allowance: u64, requested: u64 },

    // ============ Authorization Errors ============
    /// Caller is not authorized for this operation
    Unauthorized { expected: [u8; 32], actual: [u8; 32] },

    /// Only the owning bond may mint or burn a tranche ledger
    NotBond { caller: [u8; 32] },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Division by zero
    DivisionByZero,

    // ============ Registry / Minter Errors ============
    /// Config index out of bounds
    ConfigIndexOutOfBounds { index: usize, len: usize },

    /// No collateral metadata registered for this address
    UnknownCollateral { collateral: [u8; 32] },

    /// Waiting period has not elapsed since the config's last mint
    MintTooSoon { last_mint: u64, waiting_period: u64, now: u64 },
}

impl BondError {
    /// Returns a stable error code for logging/indexing
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTrancheRatio { .. } => "E001_INVALID_TRANCHE_RATIO",
            Self::InvalidTotalRatio { .. } => "E002_INVALID_TOTAL_RATIO",
            Self::TooManyTranches { .. } => "E003_TOO_MANY_TRANCHES",
            Self::NoTranches => "E004_NO_TRANCHES",
            Self::InvalidMaturityDate { .. } => "E005_INVALID_MATURITY",
            Self::InvalidAddress { .. } => "E006_INVALID_ADDRESS",
            Self::BondAlreadyExists { .. } => "E007_BOND_EXISTS",
            Self::InvalidFee { .. } => "E008_INVALID_FEE",
            Self::BondMature => "E010_BOND_MATURE",
            Self::MaturityNotReached { .. } => "E011_NOT_MATURE",
            Self::BondImmature => "E019_BOND_IMMATURE",
            Self::ZeroAmount => "E012_ZERO_AMOUNT",
            Self::DepositLimitExceeded { .. } => "E013_DEPOSIT_LIMIT",
            Self::InvalidInitialDeposit { .. } => "E014_INVALID_INITIAL_DEPOSIT",
            Self::TrancheLengthMismatch { .. } => "E015_LENGTH_MISMATCH",
            Self::InvalidRedemptionRatio => "E016_INVALID_REDEMPTION_RATIO",
            Self::MinimumDebt { .. } => "E017_MINIMUM_DEBT",
            Self::RedeemExceedsDebt { .. } => "E018_REDEEM_EXCEEDS_DEBT",
            Self::InsufficientBalance { .. } => "E020_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E021_INSUFFICIENT_ALLOWANCE",
            Self::Unauthorized { .. } => "E030_UNAUTHORIZED",
            Self::NotBond { .. } => "E031_NOT_BOND",
            Self::Overflow => "E040_OVERFLOW",
            Self::DivisionByZero => "E041_DIV_ZERO",
            Self::ConfigIndexOutOfBounds { .. } => "E050_CONFIG_INDEX",
            Self::UnknownCollateral { .. } => "E051_UNKNOWN_COLLATERAL",
            Self::MintTooSoon { .. } => "E052_MINT_TOO_SOON",
        }
    }

    /// Returns true if the caller can fix the error by retrying with
    /// corrected inputs. State is never partially mutated, so this is
    /// every error except arithmetic faults.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Overflow | Self::DivisionByZero)
    }
}
