//! Orchestration tests with scripted collaborators.

use async_trait::async_trait;
use order_recipe::clients::{AccountLookup, CatalogLookup, Lookup, LookupError};
use order_recipe::model::{Account, AccountId, Order, OrderId, Product, ProductId, RequestedItem};
use order_recipe::order_service::{OrderError, OrderService, OrderServiceConfig};
use order_recipe::order_store::{self, OrderStore, StoreError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

// =============================================================================
// Scripted collaborators
// =============================================================================

#[derive(Default)]
struct Accounts {
    known: Vec<&'static str>,
    fail: bool,
    delay: Option<Duration>,
    barrier: Option<Arc<Barrier>>,
    calls: Mutex<usize>,
}

#[async_trait]
impl AccountLookup for Accounts {
    async fn get_account(&self, id: &AccountId) -> Result<Lookup<Account>, LookupError> {
        *self.calls.lock().unwrap() += 1;
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(LookupError::Transport("connection reset".to_string()));
        }
        Ok(if self.known.contains(&id.as_str()) {
            Lookup::Found(Account {
                id: id.clone(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            })
        } else {
            Lookup::NotFound
        })
    }
}

#[derive(Default)]
struct Catalog {
    products: Vec<Product>,
    fail: bool,
    delay: Option<Duration>,
    barrier: Option<Arc<Barrier>>,
    calls: Mutex<Vec<Vec<ProductId>>>,
}

impl Catalog {
    fn with(products: &[(&str, Decimal)]) -> Self {
        Self {
            products: products
                .iter()
                .map(|(id, price)| Product::new(ProductId::from(*id), *id, format!("about {id}"), *price))
                .collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Vec<ProductId>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogLookup for Catalog {
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, LookupError> {
        self.calls.lock().unwrap().push(ids.to_vec());
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(LookupError::Transport("catalog down".to_string()));
        }
        Ok(self
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

/// Store that rejects or stalls every write.
struct BrokenStore {
    stall: bool,
    puts: Mutex<usize>,
}

#[async_trait]
impl OrderStore for BrokenStore {
    async fn put_order(&self, order: &Order) -> Result<(), StoreError> {
        *self.puts.lock().unwrap() += 1;
        if self.stall {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        Err(StoreError::DuplicateOrder(order.id))
    }

    async fn get_orders_for_account(&self, _: &AccountId) -> Result<Vec<Order>, StoreError> {
        Err(StoreError::Unavailable("disk on fire".to_string()))
    }

    async fn delete_order(&self, order_id: &OrderId) -> Result<(), StoreError> {
        Err(StoreError::NotFound(*order_id))
    }
}

fn memory_store() -> Arc<dyn OrderStore> {
    let (actor, store) = order_store::memory::new(8);
    tokio::spawn(actor.run());
    Arc::new(store)
}

fn service(
    accounts: Arc<Accounts>,
    catalog: Arc<Catalog>,
    store: Arc<dyn OrderStore>,
    timeout: Duration,
) -> OrderService {
    OrderService::new(
        accounts,
        catalog,
        store,
        OrderServiceConfig {
            call_timeout: timeout,
        },
    )
}

fn alice() -> Arc<Accounts> {
    Arc::new(Accounts {
        known: vec!["acc_1"],
        ..Default::default()
    })
}

fn acc_1() -> AccountId {
    AccountId::from("acc_1")
}

// =============================================================================
// place_order
// =============================================================================

#[tokio::test]
async fn test_total_is_sum_of_line_totals() {
    let catalog = Arc::new(Catalog::with(&[("P1", dec!(10.0)), ("P2", dec!(2.5))]));
    let service = service(alice(), catalog, memory_store(), Duration::from_secs(1));

    let order = service
        .place_order(
            &acc_1(),
            &[RequestedItem::new("P1", 2), RequestedItem::new("P2", 4)],
        )
        .await
        .unwrap();

    assert_eq!(order.total_price, dec!(30.0));
    assert_eq!(order.total_price, order.items_total());
    assert_eq!(order.account_id, acc_1());
}

#[tokio::test]
async fn test_returned_order_is_what_was_stored() {
    let catalog = Arc::new(Catalog::with(&[("A", dec!(1.25)), ("C", dec!(3.00))]));
    let store = memory_store();
    let service = service(alice(), catalog, store.clone(), Duration::from_secs(1));

    let placed = service
        .place_order(
            &acc_1(),
            &[
                RequestedItem::new("A", 2),
                RequestedItem::new("B", 0),
                RequestedItem::new("C", 3),
            ],
        )
        .await
        .unwrap();

    let stored = store.get_orders_for_account(&acc_1()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, placed.id);
    assert_eq!(stored[0].created_at, placed.created_at);
    assert_eq!(stored[0].total_price, placed.total_price);
    let lines: Vec<(&str, u32)> = stored[0]
        .items
        .iter()
        .map(|i| (i.product_id.as_str(), i.quantity))
        .collect();
    assert_eq!(lines, vec![("A", 2), ("C", 3)]);
}

#[tokio::test]
async fn test_only_zero_quantity_is_no_valid_items() {
    let catalog = Arc::new(Catalog::with(&[("B", dec!(1.00))]));
    let store = Arc::new(BrokenStore {
        stall: false,
        puts: Mutex::new(0),
    });
    let service = service(alice(), catalog, store.clone(), Duration::from_secs(1));

    let err = service
        .place_order(&acc_1(), &[RequestedItem::new("B", 0)])
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::NoValidItems { operation: "place_order" }));
    assert!(err.is_client_error());
    assert_eq!(*store.puts.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_products_are_dropped_silently() {
    let catalog = Arc::new(Catalog::with(&[("P1", dec!(5.00))]));
    let service = service(alice(), catalog, memory_store(), Duration::from_secs(1));

    let order = service
        .place_order(
            &acc_1(),
            &[RequestedItem::new("P1", 1), RequestedItem::new("P404", 7)],
        )
        .await
        .unwrap();

    assert_eq!(order.items.len(), 1);
    assert_eq!(order.total_price, dec!(5.00));
}

#[tokio::test]
async fn test_empty_account_id_is_rejected_before_any_call() {
    let accounts = alice();
    let catalog = Arc::new(Catalog::with(&[("P1", dec!(1))]));
    let service = service(accounts.clone(), catalog.clone(), memory_store(), Duration::from_secs(1));

    let err = service
        .place_order(&AccountId::from(""), &[RequestedItem::new("P1", 1)])
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::InvalidRequest { .. }));
    assert_eq!(*accounts.calls.lock().unwrap(), 0);
    assert!(catalog.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_account_is_terminal() {
    let catalog = Arc::new(Catalog::with(&[("P1", dec!(1))]));
    let service = service(alice(), catalog, memory_store(), Duration::from_secs(1));

    let err = service
        .place_order(&AccountId::from("acc_404"), &[RequestedItem::new("P1", 1)])
        .await
        .unwrap_err();

    match &err {
        OrderError::AccountNotFound { account_id, .. } => assert_eq!(account_id.as_str(), "acc_404"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_account_transport_failure_is_retryable() {
    let accounts = Arc::new(Accounts {
        fail: true,
        ..Default::default()
    });
    let catalog = Arc::new(Catalog::with(&[("P1", dec!(1))]));
    let service = service(accounts, catalog, memory_store(), Duration::from_secs(1));

    let err = service
        .place_order(&acc_1(), &[RequestedItem::new("P1", 1)])
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::AccountServiceUnavailable { .. }));
    assert!(err.is_retryable());
    assert_eq!(
        err.source().map(|s| s.to_string()).as_deref(),
        Some("transport failure: connection reset")
    );
}

#[tokio::test]
async fn test_slow_account_lookup_times_out() {
    let accounts = Arc::new(Accounts {
        known: vec!["acc_1"],
        delay: Some(Duration::from_secs(10)),
        ..Default::default()
    });
    let catalog = Arc::new(Catalog::with(&[("P1", dec!(1))]));
    let service = service(accounts, catalog, memory_store(), Duration::from_millis(50));

    let err = service
        .place_order(&acc_1(), &[RequestedItem::new("P1", 1)])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderError::AccountServiceUnavailable {
            source: LookupError::Timeout(_),
            ..
        }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_catalog_failure_is_catalog_unavailable() {
    let catalog = Arc::new(Catalog {
        fail: true,
        ..Default::default()
    });
    let service = service(alice(), catalog, memory_store(), Duration::from_secs(1));

    let err = service
        .place_order(&acc_1(), &[RequestedItem::new("P1", 1)])
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::CatalogUnavailable { .. }));
    assert!(err.is_retryable());
    assert_eq!(err.operation(), "place_order");
}

#[tokio::test]
async fn test_lookups_run_concurrently() {
    // Each lookup waits for the other one to start. Run one after the other they
    // would both hit the call timeout.
    let barrier = Arc::new(Barrier::new(2));
    let accounts = Arc::new(Accounts {
        known: vec!["acc_1"],
        barrier: Some(barrier.clone()),
        ..Default::default()
    });
    let catalog = Arc::new(Catalog {
        barrier: Some(barrier),
        ..Catalog::with(&[("P1", dec!(1))])
    });
    let service = service(accounts, catalog, memory_store(), Duration::from_secs(2));

    let order = service
        .place_order(&acc_1(), &[RequestedItem::new("P1", 1)])
        .await
        .unwrap();

    assert_eq!(order.items.len(), 1);
}

#[tokio::test]
async fn test_one_catalog_call_with_distinct_ids() {
    let catalog = Arc::new(Catalog::with(&[("A", dec!(1)), ("B", dec!(2))]));
    let service = service(alice(), catalog.clone(), memory_store(), Duration::from_secs(1));

    let order = service
        .place_order(
            &acc_1(),
            &[
                RequestedItem::new("A", 1),
                RequestedItem::new("B", 1),
                RequestedItem::new("A", 2),
                RequestedItem::new("Z", 1),
            ],
        )
        .await
        .unwrap();

    let calls = catalog.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        vec![ProductId::from("A"), ProductId::from("B"), ProductId::from("Z")]
    );
    // Repeated ids are merged into one line.
    assert_eq!(order.items[0].quantity, 3);
    assert_eq!(order.total_price, dec!(5));
}

#[tokio::test]
async fn test_no_items_skips_the_catalog() {
    let catalog = Arc::new(Catalog::default());
    let service = service(alice(), catalog.clone(), memory_store(), Duration::from_secs(1));

    let err = service.place_order(&acc_1(), &[]).await.unwrap_err();

    assert!(matches!(err, OrderError::NoValidItems { .. }));
    assert!(catalog.calls().is_empty());
}

#[tokio::test]
async fn test_store_failure_is_persistence_failure() {
    let catalog = Arc::new(Catalog::with(&[("P1", dec!(1))]));
    let store = Arc::new(BrokenStore {
        stall: false,
        puts: Mutex::new(0),
    });
    let service = service(alice(), catalog, store, Duration::from_secs(1));

    let err = service
        .place_order(&acc_1(), &[RequestedItem::new("P1", 1)])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderError::PersistenceFailure {
            source: StoreError::DuplicateOrder(_),
            ..
        }
    ));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_stalled_store_write_is_not_retryable() {
    let catalog = Arc::new(Catalog::with(&[("P1", dec!(1))]));
    let store = Arc::new(BrokenStore {
        stall: true,
        puts: Mutex::new(0),
    });
    let service = service(alice(), catalog, store, Duration::from_millis(50));

    let err = service
        .place_order(&acc_1(), &[RequestedItem::new("P1", 1)])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderError::PersistenceFailure {
            source: StoreError::WriteTimedOut(_),
            ..
        }
    ));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_write_timeout_never_commits_the_order() {
    // The store actor is not running yet, so the put sits in its queue until the
    // call deadline passes.
    let (actor, memory) = order_store::memory::new(8);
    let store: Arc<dyn OrderStore> = Arc::new(memory);
    let catalog = Arc::new(Catalog::with(&[("P1", dec!(1))]));
    let service = service(alice(), catalog, store.clone(), Duration::from_millis(50));

    let err = service
        .place_order(&acc_1(), &[RequestedItem::new("P1", 1)])
        .await
        .unwrap_err();
    tokio::spawn(actor.run());

    assert!(matches!(
        err,
        OrderError::PersistenceFailure {
            source: StoreError::WriteTimedOut(_),
            ..
        }
    ));
    assert!(!err.is_retryable());
    assert!(store.get_orders_for_account(&acc_1()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_abandoned_write_is_not_applied() {
    let (actor, memory) = order_store::memory::new(8);
    let store: Arc<dyn OrderStore> = Arc::new(memory);
    let catalog = Arc::new(Catalog::with(&[("P1", dec!(1))]));
    let service = service(alice(), catalog, store.clone(), Duration::from_secs(30));

    // Lookups answer at once, so the caller gives up while the put is queued.
    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        service.place_order(&acc_1(), &[RequestedItem::new("P1", 1)]),
    )
    .await;
    tokio::spawn(actor.run());

    assert!(abandoned.is_err());
    assert!(store.get_orders_for_account(&acc_1()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dropped_request_stores_nothing() {
    let catalog = Arc::new(Catalog {
        delay: Some(Duration::from_secs(10)),
        ..Catalog::with(&[("P1", dec!(1))])
    });
    let store = memory_store();
    let service = service(alice(), catalog, store.clone(), Duration::from_secs(30));

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        service.place_order(&acc_1(), &[RequestedItem::new("P1", 1)]),
    )
    .await;

    assert!(abandoned.is_err());
    assert!(store.get_orders_for_account(&acc_1()).await.unwrap().is_empty());
}

// =============================================================================
// reads and deletes
// =============================================================================

#[tokio::test]
async fn test_read_failure_is_persistence_failure() {
    let store = Arc::new(BrokenStore {
        stall: false,
        puts: Mutex::new(0),
    });
    let service = service(alice(), Arc::new(Catalog::default()), store, Duration::from_secs(1));

    let err = service.get_orders_for_account(&acc_1()).await.unwrap_err();

    assert!(matches!(
        err,
        OrderError::PersistenceFailure {
            operation: "get_orders_for_account",
            ..
        }
    ));
}

#[tokio::test]
async fn test_delete_missing_order_is_order_not_found() {
    let service = service(alice(), Arc::new(Catalog::default()), memory_store(), Duration::from_secs(1));
    let missing = OrderId::new();

    let err = service.delete_order(&missing).await.unwrap_err();

    assert!(matches!(err, OrderError::OrderNotFound { order_id, .. } if order_id == missing));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_reads_are_enriched_with_one_catalog_call() {
    let catalog = Arc::new(Catalog::with(&[("A", dec!(1)), ("B", dec!(2)), ("C", dec!(3))]));
    let service = service(alice(), catalog.clone(), memory_store(), Duration::from_secs(1));
    service
        .place_order(&acc_1(), &[RequestedItem::new("A", 1), RequestedItem::new("B", 1)])
        .await
        .unwrap();
    service
        .place_order(&acc_1(), &[RequestedItem::new("B", 2), RequestedItem::new("C", 1)])
        .await
        .unwrap();
    let before = catalog.calls().len();

    let orders = service.get_orders_for_account(&acc_1()).await.unwrap();

    let calls = catalog.calls();
    assert_eq!(calls.len(), before + 1);
    assert!(calls[before].len() <= 3);
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].items[0].name, "A");
    assert_eq!(orders[1].items[1].description, "about C");
}
