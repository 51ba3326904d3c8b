//! Error types for the registry

use crate::types::{Amount, IdentityKey, RegistrationId};
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Registry errors
///
/// Every variant is a whole-operation rejection: no partial state
/// mutation survives a failed call, and all errors are deterministic
/// given the state that produced them.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller lacks the administrator role
    #[error("Unauthorized: caller lacks the required role")]
    Unauthorized,

    /// No registration exists with this id
    #[error("Registration not found: {0}")]
    NotFound(RegistrationId),

    /// Identity already holds a registration
    #[error("Identity already registered: {0}")]
    AlreadyRegistered(IdentityKey),

    /// External identifier is already bound to a registration
    #[error("External identifier already in use: {0}")]
    DuplicateExternalId(String),

    /// Amount is zero or otherwise malformed
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Recipient is the reserved null identity
    #[error("Invalid recipient: the null identity cannot hold funds or registrations")]
    InvalidRecipient,

    /// Balance precondition failure
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount the operation needed
        required: Amount,
        /// Amount the caller actually holds
        available: Amount,
    },

    /// Operation would push total supply above the configured cap
    #[error("Supply cap exceeded: supply would reach {requested}, cap is {cap}")]
    SupplyCapExceeded {
        /// Supply the operation would have produced
        requested: Amount,
        /// Configured hard cap
        cap: Amount,
    },

    /// Purchase attempted while the sale is not active
    #[error("Sale is not active")]
    SaleNotActive,

    /// Sale state transition into the state it is already in
    #[error("Invalid sale state: {0}")]
    InvalidSaleState(String),

    /// Arithmetic overflow on an amount computation
    #[error("Amount overflow")]
    AmountOverflow,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Metrics(err.to_string())
    }
}
