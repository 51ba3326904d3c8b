//! Configuration for the registry

use crate::error::{Error, Result};
use crate::sale::MAX_DECIMALS;
use crate::types::{Amount, IdentityKey};
use serde::{Deserialize, Serialize};

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Identity granted the administrator role
    pub administrator: IdentityKey,

    /// Ledger configuration
    pub ledger: LedgerConfig,

    /// Sale configuration
    pub sale: SaleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "registry-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            administrator: IdentityKey::new("admin"),
            ledger: LedgerConfig::default(),
            sale: SaleConfig::default(),
        }
    }
}

/// Ledger configuration
///
/// All amounts are in base units; `decimals` fixes how many base units
/// make one whole unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Supply credited at construction
    pub initial_supply: Amount,

    /// Recipient of the initial supply
    pub initial_holder: IdentityKey,

    /// Optional hard supply cap
    pub max_supply: Option<Amount>,

    /// Base-10 exponent of the whole-unit convention
    pub decimals: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_supply: 0,
            initial_holder: IdentityKey::new("admin"),
            max_supply: None,
            decimals: 2,
        }
    }
}

/// Sale configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleConfig {
    /// External base units per whole ledger unit
    pub unit_price: Amount,

    /// Open the sale at startup instead of requiring an explicit start
    pub start_active: bool,
}

impl Default for SaleConfig {
    fn default() -> Self {
        Self {
            unit_price: 1,
            start_active: false,
        }
    }
}

impl Config {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load defaults with environment variable overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(administrator) = std::env::var("REGISTRY_ADMINISTRATOR") {
            config.administrator = IdentityKey::new(administrator.clone());
            config.ledger.initial_holder = IdentityKey::new(administrator);
        }

        if let Ok(supply) = std::env::var("REGISTRY_INITIAL_SUPPLY") {
            config.ledger.initial_supply = parse_amount("REGISTRY_INITIAL_SUPPLY", &supply)?;
        }

        if let Ok(cap) = std::env::var("REGISTRY_MAX_SUPPLY") {
            config.ledger.max_supply = Some(parse_amount("REGISTRY_MAX_SUPPLY", &cap)?);
        }

        if let Ok(price) = std::env::var("REGISTRY_UNIT_PRICE") {
            config.sale.unit_price = parse_amount("REGISTRY_UNIT_PRICE", &price)?;
        }

        Ok(config)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.administrator.is_null() {
            return Err(Error::Config(
                "administrator must not be the null identity".to_string(),
            ));
        }

        if self.ledger.initial_supply > 0 && self.ledger.initial_holder.is_null() {
            return Err(Error::Config(
                "initial supply requires a non-null initial holder".to_string(),
            ));
        }

        if let Some(cap) = self.ledger.max_supply {
            if self.ledger.initial_supply > cap {
                return Err(Error::Config(format!(
                    "initial supply {} exceeds max supply {}",
                    self.ledger.initial_supply, cap
                )));
            }
        }

        if self.ledger.decimals > MAX_DECIMALS {
            return Err(Error::Config(format!(
                "decimals must be at most {}",
                MAX_DECIMALS
            )));
        }

        if self.sale.unit_price == 0 {
            return Err(Error::Config("unit price must be positive".to_string()));
        }

        Ok(())
    }
}

fn parse_amount(name: &str, value: &str) -> Result<Amount> {
    value
        .parse::<Amount>()
        .map_err(|e| Error::Config(format!("{}: {}", name, e)))
}
