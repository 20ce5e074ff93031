//! Protocol Events
//!
//! Events are collected during contract execution and can be indexed
//! off-line for building UIs, analytics, and notifications. Every
//! state-changing operation emits exactly one event (plus a skim event
//! when extraneous collateral was swept).

use crate::types::Address;
use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Bond controller events (0x01 - 0x1F)
    Deposit = 0x01,
    Redeem = 0x02,
    Mature = 0x03,
    CollateralSkimmed = 0x04,
    FeeUpdated = 0x05,
    DepositLimitUpdated = 0x06,

    // Tranche ledger events (0x20 - 0x3F)
    TokenMint = 0x20,
    TokenBurn = 0x21,
    TokenTransfer = 0x22,
    MatureRedemption = 0x23,

    // Factory events (0x40 - 0x5F)
    BondCreated = 0x40,

    // Config vault / minter events (0x60 - 0x7F)
    BondConfigAdded = 0x60,
    BondConfigRemoved = 0x61,
    OwnershipTransferred = 0x62,
    WaitingPeriodUpdated = 0x63,
}

/// Main event enum containing all possible protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum BondEvent {
    // ============ Bond Controller Events ============

    /// Emitted when collateral is deposited for freshly minted tranches
    Deposit {
        depositor: Address,
        amount: u64,
        new_debt: u64,
        /// Fee share minted to the bond itself, one entry per tranche
        fees: Vec<u64>,
        timestamp: u64,
    },

    /// Emitted on a pre-maturity ratio-matched redemption
    Redeem {
        redeemer: Address,
        /// Burned amounts in tranche order
        amounts: Vec<u64>,
        collateral_returned: u64,
        timestamp: u64,
    },

    /// Emitted once, when the bond matures and the waterfall settles
    Mature {
        caller: Address,
        /// Collateral pushed to each tranche ledger, in tranche order
        entitlements: Vec<u64>,
        /// Collateral paid to the administrator for accrued fee balances
        fee_collateral: u64,
        timestamp: u64,
    },

    /// Emitted when extraneous collateral is swept to the administrator
    CollateralSkimmed {
        to: Address,
        amount: u64,
        timestamp: u64,
    },

    /// Emitted when the administrator changes the deposit fee
    FeeUpdated {
        old_fee_bps: u64,
        new_fee_bps: u64,
        timestamp: u64,
    },

    /// Emitted when the administrator changes the deposit limit
    DepositLimitUpdated {
        old_limit: Option<u64>,
        new_limit: Option<u64>,
        timestamp: u64,
    },

    // ============ Tranche Ledger Events ============

    /// Emitted when tranche balances are minted
    TokenMint {
        to: Address,
        amount: u64,
        new_total_supply: u64,
        timestamp: u64,
    },

    /// Emitted when tranche balances are burned
    TokenBurn {
        from: Address,
        amount: u64,
        new_total_supply: u64,
        timestamp: u64,
    },

    /// Emitted on a holder-to-holder tranche transfer
    TokenTransfer {
        from: Address,
        to: Address,
        amount: u64,
        timestamp: u64,
    },

    /// Emitted when a holder redeems matured tranches for collateral
    MatureRedemption {
        holder: Address,
        burned: u64,
        collateral_returned: u64,
        timestamp: u64,
    },

    // ============ Factory Events ============

    /// Emitted when a bond and its tranche ledgers are created
    BondCreated {
        bond_id: [u8; 32],
        collateral: Address,
        tranche_ratios: Vec<u64>,
        maturity_date: u64,
        timestamp: u64,
    },

    // ============ Config Vault / Minter Events ============

    /// Emitted when a reusable bond config is added to the vault
    BondConfigAdded {
        collateral: Address,
        tranche_ratios: Vec<u64>,
        duration: u64,
        timestamp: u64,
    },

    /// Emitted when a bond config is removed from the vault
    BondConfigRemoved {
        collateral: Address,
        tranche_ratios: Vec<u64>,
        duration: u64,
        timestamp: u64,
    },

    /// Emitted when a registry's owner changes
    OwnershipTransferred {
        old_owner: Address,
        new_owner: Address,
        timestamp: u64,
    },

    /// Emitted when the minter's waiting period changes
    WaitingPeriodUpdated {
        old_period: u64,
        new_period: u64,
        timestamp: u64,
    },
}

impl BondEvent {
    /// Get the type of this event for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Deposit { .. } => EventType::Deposit,
            Self::Redeem { .. } => EventType::Redeem,
            Self::Mature { .. } => EventType::Mature,
            Self::CollateralSkimmed { .. } => EventType::CollateralSkimmed,
            Self::FeeUpdated { .. } => EventType::FeeUpdated,
            Self::DepositLimitUpdated { .. } => EventType::DepositLimitUpdated,
            Self::TokenMint { .. } => EventType::TokenMint,
            Self::TokenBurn { .. } => EventType::TokenBurn,
            Self::TokenTransfer { .. } => EventType::TokenTransfer,
            Self::MatureRedemption { .. } => EventType::MatureRedemption,
            Self::BondCreated { .. } => EventType::BondCreated,
            Self::BondConfigAdded { .. } => EventType::BondConfigAdded,
            Self::BondConfigRemoved { .. } => EventType::BondConfigRemoved,
            Self::OwnershipTransferred { .. } => EventType::OwnershipTransferred,
            Self::WaitingPeriodUpdated { .. } => EventType::WaitingPeriodUpdated,
        }
    }

    /// Get the host timestamp when the event occurred
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Deposit { timestamp, .. } => *timestamp,
            Self::Redeem { timestamp, .. } => *timestamp,
            Self::Mature { timestamp, .. } => *timestamp,
            Self::CollateralSkimmed { timestamp, .. } => *timestamp,
            Self::FeeUpdated { timestamp, .. } => *timestamp,
            Self::DepositLimitUpdated { timestamp, .. } => *timestamp,
            Self::TokenMint { timestamp, .. } => *timestamp,
            Self::TokenBurn { timestamp, .. } => *timestamp,
            Self::TokenTransfer { timestamp, .. } => *timestamp,
            Self::MatureRedemption { timestamp, .. } => *timestamp,
            Self::BondCreated { timestamp, .. } => *timestamp,
            Self::BondConfigAdded { timestamp, .. } => *timestamp,
            Self::BondConfigRemoved { timestamp, .. } => *timestamp,
            Self::OwnershipTransferred { timestamp, .. } => *timestamp,
            Self::WaitingPeriodUpdated { timestamp, .. } => *timestamp,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting multiple events during execution
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<BondEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: BondEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[BondEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<BondEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&BondEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true when no events were emitted
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = BondEvent::Deposit {
            depositor: [1u8; 32],
            amount: 1_000_000_000_000,
            new_debt: 1_000_000_000_000,
            fees: [0, 0, 0].to_vec(),
            timestamp: 100,
        };

        assert_eq!(event.event_type(), EventType::Deposit);
        assert_eq!(event.timestamp(), 100);
    }

    #[test]
    fn test_event_serialization() {
        let event = BondEvent::Redeem {
            redeemer: [1u8; 32],
            amounts: [200, 300, 500].to_vec(),
            collateral_returned: 1000,
            timestamp: 200,
        };

        let bytes = event.to_bytes();
        let restored = BondEvent::from_bytes(&bytes).unwrap();

        assert_eq!(event, restored);
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();

        log.emit(BondEvent::CollateralSkimmed {
            to: [3u8; 32],
            amount: 50,
            timestamp: 100,
        });
        log.emit(BondEvent::Deposit {
            depositor: [1u8; 32],
            amount: 1000,
            new_debt: 1000,
            fees: [0, 0].to_vec(),
            timestamp: 100,
        });

        assert_eq!(log.len(), 2);
        assert!(log.has_events());
        assert_eq!(log.filter_by_type(EventType::Deposit).len(), 1);

        log.clear();
        assert!(log.is_empty());
    }
}
