//! Fungible balance ledger
//!
//! Per-account balances plus a total supply counter, with mint
//! (administrator-only), burn (self-service) and transfer (peer-to-peer).
//! Absent accounts read as zero; balances are created on first credit and
//! never deleted, though they may return to zero.
//!
//! Conservation holds after every successful operation:
//! Σ(balances) == total_supply == minted − burned.

use crate::error::{Error, Result};
use crate::types::{Amount, IdentityKey};
use std::collections::HashMap;

/// Balance ledger with a single designated administrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FungibleLedger {
    /// Identity allowed to mint
    administrator: IdentityKey,

    /// Per-account balances; absent key reads as zero
    balances: HashMap<IdentityKey, Amount>,

    /// Sum of all balances
    total_supply: Amount,

    /// Optional hard supply cap
    max_supply: Option<Amount>,

    /// Cumulative minted units (includes the initial supply)
    minted: Amount,

    /// Cumulative burned units
    burned: Amount,
}

impl FungibleLedger {
    /// Create a ledger, crediting the initial supply to its recipient
    ///
    /// Construction-time misconfiguration (null administrator, initial
    /// supply without a recipient, supply above the cap) is reported as
    /// `Error::Config`.
    pub fn new(
        administrator: IdentityKey,
        initial_supply: Amount,
        initial_holder: IdentityKey,
        max_supply: Option<Amount>,
    ) -> Result<Self> {
        if administrator.is_null() {
            return Err(Error::Config(
                "administrator must not be the null identity".to_string(),
            ));
        }

        if initial_supply > 0 && initial_holder.is_null() {
            return Err(Error::Config(
                "initial supply requires a non-null recipient".to_string(),
            ));
        }

        if let Some(cap) = max_supply {
            if initial_supply > cap {
                return Err(Error::Config(format!(
                    "initial supply {} exceeds max supply {}",
                    initial_supply, cap
                )));
            }
        }

        let mut balances = HashMap::new();
        if initial_supply > 0 {
            balances.insert(initial_holder, initial_supply);
        }

        Ok(Self {
            administrator,
            balances,
            total_supply: initial_supply,
            max_supply,
            minted: initial_supply,
            burned: 0,
        })
    }

    /// Mint new units to a recipient
    ///
    /// Administrator-only. Fails with `InvalidAmount` for a zero amount,
    /// `InvalidRecipient` for the null identity, and `SupplyCapExceeded`
    /// when a cap is configured and would be crossed; the whole operation
    /// is rejected, never partially applied.
    pub fn mint(&mut self, caller: &IdentityKey, to: &IdentityKey, amount: Amount) -> Result<()> {
        self.require_administrator(caller)?;
        self.credit(to, amount)?;

        tracing::info!(%to, amount, total_supply = self.total_supply, "minted units");

        Ok(())
    }

    /// Burn units from the caller's own balance
    pub fn burn(&mut self, caller: &IdentityKey, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(Error::InvalidAmount("burn amount must be positive".to_string()));
        }

        let available = self.balance_of(caller);
        if amount > available {
            return Err(Error::InsufficientBalance {
                required: amount,
                available,
            });
        }

        *self.balances.entry(caller.clone()).or_insert(0) -= amount;
        self.total_supply -= amount;
        self.burned += amount;

        tracing::info!(%caller, amount, total_supply = self.total_supply, "burned units");

        Ok(())
    }

    /// Transfer units from the caller to a recipient
    ///
    /// Net supply is unchanged; debit and credit apply together or not at
    /// all. A self-transfer of an affordable amount is a valid no-op.
    pub fn transfer(
        &mut self,
        caller: &IdentityKey,
        to: &IdentityKey,
        amount: Amount,
    ) -> Result<()> {
        if to.is_null() {
            return Err(Error::InvalidRecipient);
        }

        if amount == 0 {
            return Err(Error::InvalidAmount(
                "transfer amount must be positive".to_string(),
            ));
        }

        let available = self.balance_of(caller);
        if amount > available {
            return Err(Error::InsufficientBalance {
                required: amount,
                available,
            });
        }

        *self.balances.entry(caller.clone()).or_insert(0) -= amount;
        *self.balances.entry(to.clone()).or_insert(0) += amount;

        tracing::debug!(from = %caller, %to, amount, "transferred units");

        Ok(())
    }

    /// Balance of an identity; never fails, absent accounts read as zero
    pub fn balance_of(&self, identity: &IdentityKey) -> Amount {
        self.balances.get(identity).copied().unwrap_or(0)
    }

    /// Current total supply
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Configured supply cap, if any
    pub fn max_supply(&self) -> Option<Amount> {
        self.max_supply
    }

    /// The designated administrator identity
    pub fn administrator(&self) -> &IdentityKey {
        &self.administrator
    }

    /// Cumulative minted units
    pub fn minted(&self) -> Amount {
        self.minted
    }

    /// Cumulative burned units
    pub fn burned(&self) -> Amount {
        self.burned
    }

    /// Check the conservation invariant
    ///
    /// Σ(balances) == total_supply and total_supply == minted − burned.
    /// This is a property of the ledger as a whole, not a per-call check.
    pub fn verify_conservation(&self) -> bool {
        let mut sum: Amount = 0;
        for balance in self.balances.values() {
            sum = match sum.checked_add(*balance) {
                Some(s) => s,
                None => return false,
            };
        }

        sum == self.total_supply
            && self
                .minted
                .checked_sub(self.burned)
                .map_or(false, |net| net == self.total_supply)
    }

    /// Reject callers other than the administrator
    pub(crate) fn require_administrator(&self, caller: &IdentityKey) -> Result<()> {
        if caller == &self.administrator {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }

    /// Cap-checked credit without the administrator gate
    ///
    /// The sale path mints through here: the cap and recipient checks
    /// still apply, the role check does not.
    pub(crate) fn credit(&mut self, to: &IdentityKey, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(Error::InvalidAmount("mint amount must be positive".to_string()));
        }

        if to.is_null() {
            return Err(Error::InvalidRecipient);
        }

        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(Error::AmountOverflow)?;

        if let Some(cap) = self.max_supply {
            if new_supply > cap {
                return Err(Error::SupplyCapExceeded {
                    requested: new_supply,
                    cap,
                });
            }
        }

        *self.balances.entry(to.clone()).or_insert(0) += amount;
        self.total_supply = new_supply;
        self.minted += amount;

        Ok(())
    }
}
