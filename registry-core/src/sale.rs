//! Capped-supply sale over the fungible ledger
//!
//! A toggleable sale mode in which external payment is exchanged for
//! minted ledger credit, up to the ledger's supply cap. Payments
//! accumulate in a custody balance that only an administrator withdrawal
//! empties.
//!
//! Pricing: `unit_price` is the external base-unit cost of one whole
//! ledger unit (`10^decimals` base units). A purchase credits
//! `payment * 10^decimals / unit_price` ledger base units, truncating;
//! the full payment is taken into custody and the payer forfeits any
//! sub-unit remainder.

use crate::error::{Error, Result};
use crate::ledger::FungibleLedger;
use crate::types::{Amount, IdentityKey};

/// Largest decimals value for which `10^decimals` fits an `Amount`
pub const MAX_DECIMALS: u32 = 38;

/// Sale component owning the underlying ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CappedSaleLedger {
    /// Ledger the sale mints into
    ledger: FungibleLedger,

    /// Whether purchases are currently accepted
    active: bool,

    /// External base units per whole ledger unit
    unit_price: Amount,

    /// Base units per whole ledger unit (10^decimals)
    scaling_factor: Amount,

    /// Accumulated external payment pending withdrawal
    custody_balance: Amount,
}

impl CappedSaleLedger {
    /// Create a sale over a ledger; the sale starts inactive
    pub fn new(ledger: FungibleLedger, unit_price: Amount, decimals: u32) -> Result<Self> {
        if unit_price == 0 {
            return Err(Error::Config("unit price must be positive".to_string()));
        }

        if decimals > MAX_DECIMALS {
            return Err(Error::Config(format!(
                "decimals must be at most {}",
                MAX_DECIMALS
            )));
        }

        Ok(Self {
            ledger,
            active: false,
            unit_price,
            scaling_factor: (10 as Amount).pow(decimals),
            custody_balance: 0,
        })
    }

    /// Open the sale
    ///
    /// Administrator-only. Starting an already-active sale is rejected
    /// with `InvalidSaleState`; re-entry requires an explicit stop/start.
    pub fn start_sale(&mut self, caller: &IdentityKey) -> Result<()> {
        self.ledger.require_administrator(caller)?;

        if self.active {
            return Err(Error::InvalidSaleState("sale is already active".to_string()));
        }

        self.active = true;
        tracing::info!("sale started");

        Ok(())
    }

    /// Close the sale
    ///
    /// Administrator-only, with the same repeated-transition semantics as
    /// `start_sale`.
    pub fn stop_sale(&mut self, caller: &IdentityKey) -> Result<()> {
        self.ledger.require_administrator(caller)?;

        if !self.active {
            return Err(Error::InvalidSaleState("sale is already stopped".to_string()));
        }

        self.active = false;
        tracing::info!("sale stopped");

        Ok(())
    }

    /// Change the per-unit price
    pub fn set_unit_price(&mut self, caller: &IdentityKey, new_price: Amount) -> Result<()> {
        self.ledger.require_administrator(caller)?;

        if new_price == 0 {
            return Err(Error::InvalidAmount("unit price must be positive".to_string()));
        }

        tracing::info!(old_price = self.unit_price, new_price, "unit price changed");
        self.unit_price = new_price;

        Ok(())
    }

    /// Exchange external payment for minted ledger credit
    ///
    /// Fails with `SaleNotActive` while the sale is closed, and with
    /// `SupplyCapExceeded` when the credited amount would cross the cap;
    /// in the latter case the payment is not accepted, so no refund path
    /// is needed. A payment too small to buy a single base unit is
    /// rejected rather than silently taken. Returns the credited amount.
    pub fn purchase(&mut self, caller: &IdentityKey, payment: Amount) -> Result<Amount> {
        if !self.active {
            return Err(Error::SaleNotActive);
        }

        if payment == 0 {
            return Err(Error::InvalidAmount("payment must be positive".to_string()));
        }

        let credited = payment
            .checked_mul(self.scaling_factor)
            .ok_or(Error::AmountOverflow)?
            / self.unit_price;

        if credited == 0 {
            return Err(Error::InvalidAmount(format!(
                "payment {} buys no units at price {}",
                payment, self.unit_price
            )));
        }

        let new_custody = self
            .custody_balance
            .checked_add(payment)
            .ok_or(Error::AmountOverflow)?;

        // Cap check and credit happen together; custody commits after
        self.ledger.credit(caller, credited)?;
        self.custody_balance = new_custody;

        tracing::info!(%caller, payment, credited, "purchase completed");

        Ok(credited)
    }

    /// Withdraw the entire custody balance
    ///
    /// Administrator-only; zero custody is a valid no-op returning 0.
    pub fn withdraw(&mut self, caller: &IdentityKey) -> Result<Amount> {
        self.ledger.require_administrator(caller)?;

        let amount = std::mem::take(&mut self.custody_balance);
        if amount > 0 {
            tracing::info!(amount, "custody withdrawn");
        }

        Ok(amount)
    }

    /// Whether purchases are currently accepted
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current per-unit price in external base units
    pub fn unit_price(&self) -> Amount {
        self.unit_price
    }

    /// Accumulated external payment pending withdrawal
    pub fn custody_balance(&self) -> Amount {
        self.custody_balance
    }

    /// Read access to the underlying ledger
    pub fn ledger(&self) -> &FungibleLedger {
        &self.ledger
    }

    /// Mutable access to the underlying ledger for its own operations
    pub fn ledger_mut(&mut self) -> &mut FungibleLedger {
        &mut self.ledger
    }
}
