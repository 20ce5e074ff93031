//! Tranche Protocol Common Library
//!
//! Shared types, constants, and utilities for the tranche bond contracts.
//! This crate is the foundation for the whole protocol: the bond controller,
//! the tranche ledgers, and the factory collaborators all build on it.
//!
//! ## Accounting model
//!
//! A bond splits one pool of collateral into an ordered list of tranche
//! claims with fixed face-value ratios. The collateral may be *elastic*
//! (rebasing): reported balances can grow or shrink without any transfer.
//! The engine therefore keeps its own notional liability (`total_debt`)
//! decoupled from the raw collateral balance, and every balance-affecting
//! entry point re-reads the actual balance before trusting it.
//!
//! This crate is `no_std` compatible when built without the default `std`
//! feature (alloc is still required).

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export alloc types for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{collections::BTreeMap, string::String, vec::Vec};
#[cfg(feature = "std")]
pub use std::{collections::BTreeMap, string::String, vec::Vec};

pub mod collateral;
pub mod constants;
pub mod errors;
pub mod events;
pub mod math;
pub mod types;

// Re-exports for convenience
pub use collateral::*;
pub use constants::*;
pub use errors::*;
pub use events::*;
pub use math::*;
pub use types::*;
