//! Keyline Registry Core
//!
//! Ownership-and-ledger registry: write-once identity registrations, a
//! fungible balance ledger with mint/burn/transfer, and a capped-supply
//! sale that exchanges external payment for ledger credit.
//!
//! # Architecture
//!
//! - **Single Writer**: One actor task owns all mutable state, so no
//!   operation ever observes a partially-applied mutation
//! - **All-or-Nothing**: Every rejected operation leaves state untouched
//! - **Checked Arithmetic**: Amounts are integral base units; overflow is
//!   a rejection, never a wrap
//!
//! # Invariants
//!
//! - Conservation: Σ(balances) == total_supply == minted − burned
//! - Registration ids are issued 1, 2, 3, … with no gaps or reuse
//! - total_supply never exceeds max_supply when one is configured
//! - Custody only grows on purchase and only zeroes on withdrawal

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod config;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod metrics;
pub mod sale;
pub mod types;

// Re-exports
pub use actor::{spawn_registry, spawn_registry_with_metrics, RegistryHandle, SaleStatus};
pub use config::Config;
pub use error::{Error, Result};
pub use identity::IdentityRegistry;
pub use ledger::FungibleLedger;
pub use metrics::Metrics;
pub use sale::CappedSaleLedger;
pub use types::{Amount, IdentityKey, Profile, Registration, RegistrationId};
