//! Actor-based concurrency for the registry
//!
//! This module implements the single-writer pattern using Tokio actors:
//! one task owns the identity registry and the sale ledger, drains a
//! bounded mailbox, and executes every operation to completion before
//! the next begins. No operation can observe a partially-applied
//! mutation, and the supply-cap check and its mint commit under the same
//! message.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                External callers                       │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              RegistryHandle (Clone)                   │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │             RegistryActor (Single Task)               │
//! │   IdentityRegistry + CappedSaleLedger + Metrics       │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::config::Config;
use crate::error::{Error, Result};
use crate::identity::IdentityRegistry;
use crate::ledger::FungibleLedger;
use crate::metrics::Metrics;
use crate::sale::CappedSaleLedger;
use crate::types::{Amount, IdentityKey, Profile, Registration, RegistrationId};
use tokio::sync::{mpsc, oneshot};

/// Snapshot of the sale-facing read surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleStatus {
    /// Whether purchases are currently accepted
    pub active: bool,

    /// External base units per whole ledger unit
    pub unit_price: Amount,

    /// Accumulated external payment pending withdrawal
    pub custody_balance: Amount,

    /// Configured supply cap, if any
    pub max_supply: Option<Amount>,

    /// The administrator identity
    pub administrator: IdentityKey,
}

/// Message sent to the registry actor
pub enum RegistryMessage {
    /// Register an identity
    Register {
        /// Identity to register
        identity: IdentityKey,
        /// Unique external identifier
        external_id: String,
        /// Optional profile tuple
        profile: Option<Profile>,
        /// Response channel
        response: oneshot::Sender<Result<RegistrationId>>,
    },

    /// Look up a registration by id
    GetRegistration {
        /// Registration id
        id: RegistrationId,
        /// Response channel
        response: oneshot::Sender<Result<Registration>>,
    },

    /// Look up the owner of a registration
    OwnerOf {
        /// Registration id
        id: RegistrationId,
        /// Response channel
        response: oneshot::Sender<Result<IdentityKey>>,
    },

    /// Mint units (administrator-only)
    Mint {
        /// Calling identity
        caller: IdentityKey,
        /// Recipient
        to: IdentityKey,
        /// Amount in base units
        amount: Amount,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Burn units from the caller's balance
    Burn {
        /// Calling identity
        caller: IdentityKey,
        /// Amount in base units
        amount: Amount,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Transfer units between accounts
    Transfer {
        /// Calling identity
        caller: IdentityKey,
        /// Recipient
        to: IdentityKey,
        /// Amount in base units
        amount: Amount,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Read a balance
    BalanceOf {
        /// Identity to read
        identity: IdentityKey,
        /// Response channel
        response: oneshot::Sender<Amount>,
    },

    /// Read the total supply
    TotalSupply {
        /// Response channel
        response: oneshot::Sender<Amount>,
    },

    /// Open the sale (administrator-only)
    StartSale {
        /// Calling identity
        caller: IdentityKey,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Close the sale (administrator-only)
    StopSale {
        /// Calling identity
        caller: IdentityKey,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Change the per-unit price (administrator-only)
    SetUnitPrice {
        /// Calling identity
        caller: IdentityKey,
        /// New price in external base units
        price: Amount,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Exchange payment for ledger credit
    Purchase {
        /// Calling identity
        caller: IdentityKey,
        /// Payment in external base units
        payment: Amount,
        /// Response channel
        response: oneshot::Sender<Result<Amount>>,
    },

    /// Withdraw the custody balance (administrator-only)
    Withdraw {
        /// Calling identity
        caller: IdentityKey,
        /// Response channel
        response: oneshot::Sender<Result<Amount>>,
    },

    /// Read the sale status snapshot
    SaleStatus {
        /// Response channel
        response: oneshot::Sender<SaleStatus>,
    },

    /// Check the conservation invariant
    CheckConservation {
        /// Response channel
        response: oneshot::Sender<bool>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes registry messages
pub struct RegistryActor {
    /// Identity registrations
    identity: IdentityRegistry,

    /// Sale ledger (owns the fungible ledger)
    sale: CappedSaleLedger,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<RegistryMessage>,

    /// Metrics collector
    metrics: Metrics,
}

impl RegistryActor {
    /// Create new actor
    pub fn new(
        identity: IdentityRegistry,
        sale: CappedSaleLedger,
        mailbox: mpsc::Receiver<RegistryMessage>,
        metrics: Metrics,
    ) -> Self {
        Self {
            identity,
            sale,
            mailbox,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                RegistryMessage::Shutdown => break,
                msg => self.handle_message(msg),
            }
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: RegistryMessage) {
        match msg {
            RegistryMessage::Register {
                identity,
                external_id,
                profile,
                response,
            } => {
                let result = self.identity.register(identity, external_id, profile);
                match &result {
                    Ok(_) => self.metrics.registrations_total.inc(),
                    Err(_) => self.metrics.record_rejection(),
                }
                let _ = response.send(result);
            }

            RegistryMessage::GetRegistration { id, response } => {
                let result = self.identity.registration(id).cloned();
                let _ = response.send(result);
            }

            RegistryMessage::OwnerOf { id, response } => {
                let result = self.identity.owner_of(id).cloned();
                let _ = response.send(result);
            }

            RegistryMessage::Mint {
                caller,
                to,
                amount,
                response,
            } => {
                let result = self.sale.ledger_mut().mint(&caller, &to, amount);
                match &result {
                    Ok(()) => {
                        self.metrics.mints_total.inc();
                        self.metrics.set_total_supply(self.sale.ledger().total_supply());
                    }
                    Err(_) => self.metrics.record_rejection(),
                }
                let _ = response.send(result);
            }

            RegistryMessage::Burn {
                caller,
                amount,
                response,
            } => {
                let result = self.sale.ledger_mut().burn(&caller, amount);
                match &result {
                    Ok(()) => {
                        self.metrics.burns_total.inc();
                        self.metrics.set_total_supply(self.sale.ledger().total_supply());
                    }
                    Err(_) => self.metrics.record_rejection(),
                }
                let _ = response.send(result);
            }

            RegistryMessage::Transfer {
                caller,
                to,
                amount,
                response,
            } => {
                let result = self.sale.ledger_mut().transfer(&caller, &to, amount);
                match &result {
                    Ok(()) => self.metrics.transfers_total.inc(),
                    Err(_) => self.metrics.record_rejection(),
                }
                let _ = response.send(result);
            }

            RegistryMessage::BalanceOf { identity, response } => {
                let _ = response.send(self.sale.ledger().balance_of(&identity));
            }

            RegistryMessage::TotalSupply { response } => {
                let _ = response.send(self.sale.ledger().total_supply());
            }

            RegistryMessage::StartSale { caller, response } => {
                let result = self.sale.start_sale(&caller);
                if result.is_err() {
                    self.metrics.record_rejection();
                }
                let _ = response.send(result);
            }

            RegistryMessage::StopSale { caller, response } => {
                let result = self.sale.stop_sale(&caller);
                if result.is_err() {
                    self.metrics.record_rejection();
                }
                let _ = response.send(result);
            }

            RegistryMessage::SetUnitPrice {
                caller,
                price,
                response,
            } => {
                let result = self.sale.set_unit_price(&caller, price);
                if result.is_err() {
                    self.metrics.record_rejection();
                }
                let _ = response.send(result);
            }

            RegistryMessage::Purchase {
                caller,
                payment,
                response,
            } => {
                let result = self.sale.purchase(&caller, payment);
                match &result {
                    Ok(_) => {
                        self.metrics.purchases_total.inc();
                        self.metrics.set_total_supply(self.sale.ledger().total_supply());
                        self.metrics.set_custody_balance(self.sale.custody_balance());
                    }
                    Err(_) => self.metrics.record_rejection(),
                }
                let _ = response.send(result);
            }

            RegistryMessage::Withdraw { caller, response } => {
                let result = self.sale.withdraw(&caller);
                match &result {
                    Ok(_) => self.metrics.set_custody_balance(self.sale.custody_balance()),
                    Err(_) => self.metrics.record_rejection(),
                }
                let _ = response.send(result);
            }

            RegistryMessage::SaleStatus { response } => {
                let _ = response.send(SaleStatus {
                    active: self.sale.is_active(),
                    unit_price: self.sale.unit_price(),
                    custody_balance: self.sale.custody_balance(),
                    max_supply: self.sale.ledger().max_supply(),
                    administrator: self.sale.ledger().administrator().clone(),
                });
            }

            RegistryMessage::CheckConservation { response } => {
                let _ = response.send(self.sale.ledger().verify_conservation());
            }

            RegistryMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryMessage>,
}

impl RegistryHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<RegistryMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RegistryMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Register an identity under a unique external identifier
    pub async fn register(
        &self,
        identity: IdentityKey,
        external_id: impl Into<String>,
        profile: Option<Profile>,
    ) -> Result<RegistrationId> {
        let external_id = external_id.into();
        self.request(|response| RegistryMessage::Register {
            identity,
            external_id,
            profile,
            response,
        })
        .await?
    }

    /// Look up a registration by id
    pub async fn registration(&self, id: RegistrationId) -> Result<Registration> {
        self.request(|response| RegistryMessage::GetRegistration { id, response })
            .await?
    }

    /// Identity that owns a registration
    pub async fn owner_of(&self, id: RegistrationId) -> Result<IdentityKey> {
        self.request(|response| RegistryMessage::OwnerOf { id, response })
            .await?
    }

    /// Mint units to a recipient (administrator-only)
    pub async fn mint(
        &self,
        caller: IdentityKey,
        to: IdentityKey,
        amount: Amount,
    ) -> Result<()> {
        self.request(|response| RegistryMessage::Mint {
            caller,
            to,
            amount,
            response,
        })
        .await?
    }

    /// Burn units from the caller's balance
    pub async fn burn(&self, caller: IdentityKey, amount: Amount) -> Result<()> {
        self.request(|response| RegistryMessage::Burn {
            caller,
            amount,
            response,
        })
        .await?
    }

    /// Transfer units to a recipient
    pub async fn transfer(
        &self,
        caller: IdentityKey,
        to: IdentityKey,
        amount: Amount,
    ) -> Result<()> {
        self.request(|response| RegistryMessage::Transfer {
            caller,
            to,
            amount,
            response,
        })
        .await?
    }

    /// Balance of an identity
    pub async fn balance_of(&self, identity: IdentityKey) -> Result<Amount> {
        self.request(|response| RegistryMessage::BalanceOf { identity, response })
            .await
    }

    /// Current total supply
    pub async fn total_supply(&self) -> Result<Amount> {
        self.request(|response| RegistryMessage::TotalSupply { response })
            .await
    }

    /// Open the sale (administrator-only)
    pub async fn start_sale(&self, caller: IdentityKey) -> Result<()> {
        self.request(|response| RegistryMessage::StartSale { caller, response })
            .await?
    }

    /// Close the sale (administrator-only)
    pub async fn stop_sale(&self, caller: IdentityKey) -> Result<()> {
        self.request(|response| RegistryMessage::StopSale { caller, response })
            .await?
    }

    /// Change the per-unit price (administrator-only)
    pub async fn set_unit_price(&self, caller: IdentityKey, price: Amount) -> Result<()> {
        self.request(|response| RegistryMessage::SetUnitPrice {
            caller,
            price,
            response,
        })
        .await?
    }

    /// Exchange payment for ledger credit; returns the credited amount
    pub async fn purchase(&self, caller: IdentityKey, payment: Amount) -> Result<Amount> {
        self.request(|response| RegistryMessage::Purchase {
            caller,
            payment,
            response,
        })
        .await?
    }

    /// Withdraw the custody balance (administrator-only)
    pub async fn withdraw(&self, caller: IdentityKey) -> Result<Amount> {
        self.request(|response| RegistryMessage::Withdraw { caller, response })
            .await?
    }

    /// Sale status snapshot
    pub async fn sale_status(&self) -> Result<SaleStatus> {
        self.request(|response| RegistryMessage::SaleStatus { response })
            .await
    }

    /// Whether purchases are currently accepted
    pub async fn is_active(&self) -> Result<bool> {
        Ok(self.sale_status().await?.active)
    }

    /// Current per-unit price
    pub async fn unit_price(&self) -> Result<Amount> {
        Ok(self.sale_status().await?.unit_price)
    }

    /// Configured supply cap, if any
    pub async fn max_supply(&self) -> Result<Option<Amount>> {
        Ok(self.sale_status().await?.max_supply)
    }

    /// The administrator identity
    pub async fn administrator(&self) -> Result<IdentityKey> {
        Ok(self.sale_status().await?.administrator)
    }

    /// Check the conservation invariant
    pub async fn check_conservation(&self) -> Result<bool> {
        self.request(|response| RegistryMessage::CheckConservation { response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(RegistryMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the registry actor from a validated configuration
pub fn spawn_registry(config: Config) -> Result<RegistryHandle> {
    let metrics = Metrics::new()?;
    spawn_registry_with_metrics(config, metrics)
}

/// Spawn the registry actor, sharing a caller-owned metrics collector
pub fn spawn_registry_with_metrics(config: Config, metrics: Metrics) -> Result<RegistryHandle> {
    config.validate()?;

    let ledger = FungibleLedger::new(
        config.administrator.clone(),
        config.ledger.initial_supply,
        config.ledger.initial_holder.clone(),
        config.ledger.max_supply,
    )?;

    let mut sale = CappedSaleLedger::new(ledger, config.sale.unit_price, config.ledger.decimals)?;
    if config.sale.start_active {
        sale.start_sale(&config.administrator)?;
    }

    metrics.set_total_supply(sale.ledger().total_supply());

    let (tx, rx) = mpsc::channel(1000); // Bounded channel for backpressure
    let actor = RegistryActor::new(IdentityRegistry::new(), sale, rx, metrics);

    tokio::spawn(async move {
        actor.run().await;
    });

    Ok(RegistryHandle::new(tx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> IdentityKey {
        IdentityKey::new("admin")
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.ledger.initial_supply = 100_000;
        config.ledger.max_supply = Some(1_000_000);
        config
    }

    #[tokio::test]
    async fn test_spawn_and_shutdown() {
        let handle = spawn_registry(test_config()).unwrap();
        assert_eq!(handle.total_supply().await.unwrap(), 100_000);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_register_through_handle() {
        let handle = spawn_registry(test_config()).unwrap();

        let id = handle
            .register(IdentityKey::new("alice"), "uuid-alice", None)
            .await
            .unwrap();
        assert_eq!(id, 1);

        let registration = handle.registration(1).await.unwrap();
        assert_eq!(registration.external_id, "uuid-alice");
        assert_eq!(handle.owner_of(1).await.unwrap(), IdentityKey::new("alice"));

        let err = handle.registration(999).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(999)));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_ledger_operations_through_handle() {
        let handle = spawn_registry(test_config()).unwrap();
        let alice = IdentityKey::new("alice");

        handle
            .mint(admin(), alice.clone(), 500)
            .await
            .unwrap();
        assert_eq!(handle.balance_of(alice.clone()).await.unwrap(), 500);

        handle
            .transfer(alice.clone(), IdentityKey::new("bob"), 200)
            .await
            .unwrap();
        handle.burn(alice.clone(), 100).await.unwrap();

        assert_eq!(handle.balance_of(alice).await.unwrap(), 200);
        assert_eq!(handle.total_supply().await.unwrap(), 100_400);
        assert!(handle.check_conservation().await.unwrap());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_sale_lifecycle_through_handle() {
        let handle = spawn_registry(test_config()).unwrap();
        let alice = IdentityKey::new("alice");

        assert!(!handle.is_active().await.unwrap());
        assert!(matches!(
            handle.purchase(alice.clone(), 100).await.unwrap_err(),
            Error::SaleNotActive
        ));

        handle.start_sale(admin()).await.unwrap();
        let credited = handle.purchase(alice.clone(), 100).await.unwrap();
        assert_eq!(credited, 10_000);

        let status = handle.sale_status().await.unwrap();
        assert_eq!(status.custody_balance, 100);
        assert_eq!(status.administrator, admin());

        assert_eq!(handle.withdraw(admin()).await.unwrap(), 100);
        handle.stop_sale(admin()).await.unwrap();

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_start_active_config() {
        let mut config = test_config();
        config.sale.start_active = true;

        let handle = spawn_registry(config).unwrap();
        assert!(handle.is_active().await.unwrap());
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_metrics_track_operations() {
        let metrics = Metrics::new().unwrap();
        let handle =
            spawn_registry_with_metrics(test_config(), metrics.clone()).unwrap();
        let alice = IdentityKey::new("alice");

        handle.mint(admin(), alice.clone(), 500).await.unwrap();
        handle
            .register(alice.clone(), "uuid-alice", None)
            .await
            .unwrap();

        // Unauthorized mint is a rejection
        handle
            .mint(alice.clone(), alice.clone(), 1)
            .await
            .unwrap_err();

        assert_eq!(metrics.mints_total.get(), 1);
        assert_eq!(metrics.registrations_total.get(), 1);
        assert_eq!(metrics.rejections_total.get(), 1);
        assert_eq!(metrics.total_supply.get(), 100_500);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_at_spawn() {
        let mut config = test_config();
        config.sale.unit_price = 0;
        assert!(matches!(spawn_registry(config), Err(Error::Config(_))));
    }
}
