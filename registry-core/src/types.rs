//! Core types for the registry
//!
//! All types are designed for:
//! - Deterministic serialization (serde)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (integral base units, checked operations)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger quantity in integral base units
///
/// A whole ledger unit is `10^decimals` base units; the decimals
/// convention is fixed at construction. External payment amounts use the
/// same representation on the payment currency's side.
pub type Amount = u128;

/// Sequential registration id, first issued id is 1
pub type RegistrationId = u64;

/// Opaque principal under which registrations and balances are tracked
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Create new identity key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The reserved null identity
    ///
    /// It can never register or receive funds; transfers and mints
    /// naming it are rejected with `InvalidRecipient`.
    pub fn null() -> Self {
        Self(String::new())
    }

    /// Whether this is the reserved null identity
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for IdentityKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Optional registration profile
///
/// Registrations bind either a bare external identifier (a UUID in the
/// common case) or an identifier plus this profile tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name
    pub username: String,

    /// Contact handle (email, phone, etc.)
    pub contact: String,

    /// URI of out-of-band profile metadata
    pub metadata_uri: String,
}

/// Write-once record binding an identity to a unique external identifier
///
/// A registration, once created, is immutable and never destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Sequential registration id
    pub id: RegistrationId,

    /// Identity that owns this registration
    pub identity: IdentityKey,

    /// Globally unique external identifier (case-sensitive)
    pub external_id: String,

    /// Optional profile tuple
    pub profile: Option<Profile>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
