//! Property-based tests for registry invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Conservation: Σ(balances) == total_supply == minted − burned
//! - Registration ids: dense, monotone, never consumed by failures
//! - Supply cap: never exceeded by any purchase sequence
//! - All-or-nothing: failed operations leave state untouched

use proptest::prelude::*;
use registry_core::{
    spawn_registry, Amount, CappedSaleLedger, Config, Error, FungibleLedger, IdentityKey,
    IdentityRegistry,
};

/// Small identity pool so operations collide on the same accounts
fn identity_pool() -> Vec<IdentityKey> {
    ["admin", "alice", "bob", "carol", "dave"]
        .iter()
        .map(|name| IdentityKey::new(*name))
        .collect()
}

fn admin() -> IdentityKey {
    IdentityKey::new("admin")
}

/// A ledger operation drawn from the public mutation surface
#[derive(Debug, Clone)]
enum LedgerOp {
    Mint { caller: usize, to: usize, amount: Amount },
    Burn { caller: usize, amount: Amount },
    Transfer { caller: usize, to: usize, amount: Amount },
}

fn ledger_op_strategy() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        (0..5usize, 0..5usize, 0..2_000u128).prop_map(|(caller, to, amount)| {
            LedgerOp::Mint { caller, to, amount }
        }),
        (0..5usize, 0..2_000u128)
            .prop_map(|(caller, amount)| LedgerOp::Burn { caller, amount }),
        (0..5usize, 0..5usize, 0..2_000u128).prop_map(|(caller, to, amount)| {
            LedgerOp::Transfer { caller, to, amount }
        }),
    ]
}

fn apply(ledger: &mut FungibleLedger, op: &LedgerOp, pool: &[IdentityKey]) -> Result<(), Error> {
    match op {
        LedgerOp::Mint { caller, to, amount } => {
            ledger.mint(&pool[*caller], &pool[*to], *amount)
        }
        LedgerOp::Burn { caller, amount } => ledger.burn(&pool[*caller], *amount),
        LedgerOp::Transfer { caller, to, amount } => {
            ledger.transfer(&pool[*caller], &pool[*to], *amount)
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: conservation holds after every operation, successful or not
    #[test]
    fn prop_conservation_holds(ops in prop::collection::vec(ledger_op_strategy(), 1..60)) {
        let pool = identity_pool();
        let mut ledger = FungibleLedger::new(admin(), 10_000, admin(), None).unwrap();

        for op in &ops {
            let _ = apply(&mut ledger, op, &pool);
            prop_assert!(ledger.verify_conservation());
        }
    }

    /// Property: total supply tracks cumulative minted minus burned exactly
    #[test]
    fn prop_supply_equals_minted_minus_burned(
        ops in prop::collection::vec(ledger_op_strategy(), 1..60)
    ) {
        let pool = identity_pool();
        let mut ledger = FungibleLedger::new(admin(), 10_000, admin(), None).unwrap();

        for op in &ops {
            let _ = apply(&mut ledger, op, &pool);
        }

        prop_assert_eq!(ledger.total_supply(), ledger.minted() - ledger.burned());
    }

    /// Property: a capped ledger never exceeds its cap under any operation mix
    #[test]
    fn prop_cap_never_exceeded(ops in prop::collection::vec(ledger_op_strategy(), 1..60)) {
        let pool = identity_pool();
        let cap = 15_000u128;
        let mut ledger = FungibleLedger::new(admin(), 10_000, admin(), Some(cap)).unwrap();

        for op in &ops {
            let _ = apply(&mut ledger, op, &pool);
            prop_assert!(ledger.total_supply() <= cap);
        }
    }

    /// Property: failed operations leave the ledger byte-identical
    #[test]
    fn prop_failures_mutate_nothing(ops in prop::collection::vec(ledger_op_strategy(), 1..60)) {
        let pool = identity_pool();
        let mut ledger = FungibleLedger::new(admin(), 5_000, admin(), Some(12_000)).unwrap();

        for op in &ops {
            let before = ledger.clone();
            if apply(&mut ledger, op, &pool).is_err() {
                prop_assert_eq!(&ledger, &before);
            }
        }
    }

    /// Property: registration ids are issued 1, 2, 3, … in success order,
    /// and failed attempts consume nothing
    #[test]
    fn prop_registration_ids_dense(
        attempts in prop::collection::vec((0..8usize, 0..8usize), 1..40)
    ) {
        let names: Vec<IdentityKey> = (0..8)
            .map(|i| IdentityKey::new(format!("user-{}", i)))
            .collect();
        let mut registry = IdentityRegistry::new();
        let mut expected_next = 1u64;

        for (who, external) in attempts {
            let result = registry.register(
                names[who].clone(),
                format!("ext-{}", external),
                None,
            );
            if let Ok(id) = result {
                prop_assert_eq!(id, expected_next);
                expected_next += 1;
            }
        }

        prop_assert_eq!(registry.len() as u64, expected_next - 1);

        // Every issued id resolves; the next one does not
        for id in 1..expected_next {
            prop_assert!(registry.registration(id).is_ok());
        }
        prop_assert!(registry.registration(expected_next).is_err());
    }

    /// Property: no purchase sequence pushes supply past the cap, and
    /// custody matches the sum of accepted payments
    #[test]
    fn prop_purchases_respect_cap(payments in prop::collection::vec(1..5_000u128, 1..40)) {
        let cap = 1_000_000u128;
        let ledger = FungibleLedger::new(admin(), 100_000, admin(), Some(cap)).unwrap();
        let mut sale = CappedSaleLedger::new(ledger, 1, 2).unwrap();
        sale.start_sale(&admin()).unwrap();

        let buyer = IdentityKey::new("buyer");
        let mut accepted = 0u128;

        for payment in payments {
            if sale.purchase(&buyer, payment).is_ok() {
                accepted += payment;
            }
            prop_assert!(sale.ledger().total_supply() <= cap);
            prop_assert_eq!(sale.custody_balance(), accepted);
            prop_assert!(sale.ledger().verify_conservation());
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use registry_core::Profile;
    use uuid::Uuid;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    /// Reference configuration from the fundraising scenario: 1000 whole
    /// units of initial supply, a 10000 whole-unit cap, two decimals, and
    /// a unit price of one external base unit (0.01 in display units).
    fn fundraising_config() -> Config {
        let mut config = Config::default();
        config.ledger.initial_supply = 100_000;
        config.ledger.max_supply = Some(1_000_000);
        config.ledger.decimals = 2;
        config.sale.unit_price = 1;
        config
    }

    #[tokio::test]
    async fn test_fundraising_lifecycle() {
        init_tracing();
        let handle = spawn_registry(fundraising_config()).unwrap();
        let admin = IdentityKey::new("admin");
        let buyer = IdentityKey::new("buyer");

        // Initial supply sits with the administrator
        assert_eq!(handle.total_supply().await.unwrap(), 100_000);
        assert_eq!(handle.balance_of(admin.clone()).await.unwrap(), 100_000);
        assert_eq!(handle.administrator().await.unwrap(), admin);

        // Buying before the sale opens is rejected outright
        let err = handle.purchase(buyer.clone(), 100).await.unwrap_err();
        assert!(matches!(err, Error::SaleNotActive));
        assert_eq!(handle.total_supply().await.unwrap(), 100_000);

        handle.start_sale(admin.clone()).await.unwrap();

        // One display unit of payment buys 100 whole units at 0.01 each
        let credited = handle.purchase(buyer.clone(), 100).await.unwrap();
        assert_eq!(credited, 10_000);
        assert_eq!(handle.balance_of(buyer.clone()).await.unwrap(), 10_000);
        assert_eq!(handle.total_supply().await.unwrap(), 110_000);
        assert_eq!(handle.sale_status().await.unwrap().custody_balance, 100);

        // A purchase that would cross the cap is rejected in full
        let before = handle.sale_status().await.unwrap();
        let err = handle.purchase(buyer.clone(), 100_000).await.unwrap_err();
        assert!(matches!(err, Error::SupplyCapExceeded { .. }));
        assert_eq!(handle.total_supply().await.unwrap(), 110_000);
        assert_eq!(
            handle.sale_status().await.unwrap().custody_balance,
            before.custody_balance
        );

        // Only the administrator can withdraw, and withdrawal zeroes custody
        let err = handle.withdraw(buyer.clone()).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        assert_eq!(handle.withdraw(admin.clone()).await.unwrap(), 100);
        assert_eq!(handle.sale_status().await.unwrap().custody_balance, 0);

        handle.stop_sale(admin.clone()).await.unwrap();
        assert!(!handle.is_active().await.unwrap());

        assert!(handle.check_conservation().await.unwrap());
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_identity_registration_flow() {
        init_tracing();
        let handle = spawn_registry(Config::default()).unwrap();
        let alice = IdentityKey::new("alice");
        let bob = IdentityKey::new("bob");

        let alice_uuid = Uuid::new_v4().to_string();
        let id = handle
            .register(
                alice.clone(),
                alice_uuid.clone(),
                Some(Profile {
                    username: "alice".to_string(),
                    contact: "alice@example.com".to_string(),
                    metadata_uri: "https://example.com/alice.json".to_string(),
                }),
            )
            .await
            .unwrap();
        assert_eq!(id, 1);

        // One registration per identity, regardless of identifier
        let err = handle
            .register(alice.clone(), Uuid::new_v4().to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered(_)));

        // An identifier can never be claimed twice
        let err = handle
            .register(bob.clone(), alice_uuid, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateExternalId(_)));

        let id = handle
            .register(bob.clone(), Uuid::new_v4().to_string(), None)
            .await
            .unwrap();
        assert_eq!(id, 2);

        assert_eq!(handle.owner_of(1).await.unwrap(), alice);
        assert_eq!(handle.owner_of(2).await.unwrap(), bob);
        assert!(matches!(
            handle.owner_of(999).await.unwrap_err(),
            Error::NotFound(999)
        ));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_transfer_and_burn_through_handle() {
        init_tracing();
        let handle = spawn_registry(fundraising_config()).unwrap();
        let admin = IdentityKey::new("admin");
        let alice = IdentityKey::new("alice");
        let bob = IdentityKey::new("bob");

        handle
            .transfer(admin.clone(), alice.clone(), 5_000)
            .await
            .unwrap();
        handle
            .transfer(alice.clone(), bob.clone(), 5_000)
            .await
            .unwrap();
        assert_eq!(handle.balance_of(alice.clone()).await.unwrap(), 0);
        assert_eq!(handle.balance_of(bob.clone()).await.unwrap(), 5_000);

        // Overdraft rejected, both balances unchanged
        let err = handle
            .transfer(alice.clone(), bob.clone(), 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientBalance {
                required: 1,
                available: 0
            }
        ));
        assert_eq!(handle.balance_of(bob.clone()).await.unwrap(), 5_000);

        handle.burn(bob.clone(), 5_000).await.unwrap();
        assert_eq!(handle.total_supply().await.unwrap(), 95_000);
        assert!(handle.check_conservation().await.unwrap());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_non_administrator_mint_rejected() {
        init_tracing();
        let handle = spawn_registry(fundraising_config()).unwrap();
        let alice = IdentityKey::new("alice");

        let err = handle
            .mint(alice.clone(), alice.clone(), 100)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        assert_eq!(handle.total_supply().await.unwrap(), 100_000);

        handle.shutdown().await.unwrap();
    }
}
