//! # Order Service
//!
//! Places, lists and deletes orders. Placing an order checks the account and
//! prices the requested items against the catalog, both at the same time. It then
//! drops whatever cannot be ordered, computes the total and persists the aggregate
//! in one atomic write.
//!
//! The service depends only on the [`AccountLookup`], [`CatalogLookup`] and
//! [`OrderStore`] traits. Every call it makes through them is bounded by
//! [`OrderServiceConfig::call_timeout`].

pub mod enrichment;
pub mod error;
pub mod reconcile;

pub use enrichment::OrderEnricher;
pub use error::*;

use crate::clients::{AccountLookup, CatalogLookup, Lookup, LookupError};
use crate::model::{Account, AccountId, Order, OrderId, Product, ProductId, RequestedItem};
use crate::order_store::{OrderStore, StoreError};
use reconcile::{distinct_product_ids, reconcile};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Tunables for [`OrderService`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrderServiceConfig {
    /// Upper bound for each individual outbound call.
    pub call_timeout: Duration,
}

impl Default for OrderServiceConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_millis(2000),
        }
    }
}

/// Runs `call` with a deadline, turning an elapsed deadline into `timed_out(limit)`.
pub(crate) async fn bounded<T, E>(
    limit: Duration,
    call: impl Future<Output = Result<T, E>>,
    timed_out: fn(Duration) -> E,
) -> Result<T, E> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(timed_out(limit)))
}

#[derive(Clone)]
pub struct OrderService {
    accounts: Arc<dyn AccountLookup>,
    catalog: Arc<dyn CatalogLookup>,
    store: Arc<dyn OrderStore>,
    enricher: OrderEnricher,
    config: OrderServiceConfig,
}

impl OrderService {
    pub fn new(
        accounts: Arc<dyn AccountLookup>,
        catalog: Arc<dyn CatalogLookup>,
        store: Arc<dyn OrderStore>,
        config: OrderServiceConfig,
    ) -> Self {
        let enricher = OrderEnricher::new(catalog.clone(), config.call_timeout);
        Self {
            accounts,
            catalog,
            store,
            enricher,
            config,
        }
    }

    /// Validates, prices and persists a new order for `account_id`.
    ///
    /// Requested lines with an unknown product or a zero quantity are left out of the
    /// order without error. If nothing is left, the request fails with
    /// [`OrderError::NoValidItems`]. The returned order is exactly what was stored.
    #[instrument(skip(self, items), fields(account_id = %account_id, requested = items.len()))]
    pub async fn place_order(
        &self,
        account_id: &AccountId,
        items: &[RequestedItem],
    ) -> Result<Order, OrderError> {
        const OP: &str = "place_order";

        if account_id.as_str().trim().is_empty() {
            return Err(OrderError::InvalidRequest {
                operation: OP,
                reason: "account id must not be empty".to_string(),
            });
        }

        let product_ids = distinct_product_ids(items);
        let (_account, products) = tokio::try_join!(
            self.check_account(OP, account_id),
            self.fetch_products(OP, &product_ids),
        )?;

        let lines = reconcile(items, &products);
        if lines.is_empty() {
            warn!("No orderable items after reconciliation");
            return Err(OrderError::NoValidItems { operation: OP });
        }
        let merged = items.len() - product_ids.len();
        let dropped = product_ids.len() - lines.len();

        let order = Order::assemble(account_id.clone(), lines);
        bounded(
            self.config.call_timeout,
            self.store.put_order(&order),
            StoreError::WriteTimedOut,
        )
        .await
        .map_err(|source| OrderError::PersistenceFailure {
            operation: OP,
            source,
        })?;

        info!(
            order_id = %order.id,
            items = order.items.len(),
            merged,
            dropped,
            total = %order.total_price,
            "Order placed"
        );
        Ok(order)
    }

    /// Every order of the account, oldest first, with current catalog details.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn get_orders_for_account(&self, account_id: &AccountId) -> Result<Vec<Order>, OrderError> {
        const OP: &str = "get_orders_for_account";

        let orders = bounded(
            self.config.call_timeout,
            self.store.get_orders_for_account(account_id),
            StoreError::Timeout,
        )
        .await
        .map_err(|source| OrderError::PersistenceFailure {
            operation: OP,
            source,
        })?;

        Ok(self.enricher.enrich(orders).await)
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: &OrderId) -> Result<(), OrderError> {
        const OP: &str = "delete_order";

        bounded(
            self.config.call_timeout,
            self.store.delete_order(order_id),
            StoreError::Timeout,
        )
        .await
        .map_err(|source| match source {
            StoreError::NotFound(order_id) => OrderError::OrderNotFound {
                operation: OP,
                order_id,
            },
            source => OrderError::PersistenceFailure {
                operation: OP,
                source,
            },
        })?;

        info!("Order deleted");
        Ok(())
    }

    async fn check_account(&self, op: &'static str, account_id: &AccountId) -> Result<Account, OrderError> {
        let lookup = bounded(
            self.config.call_timeout,
            self.accounts.get_account(account_id),
            LookupError::Timeout,
        )
        .await
        .map_err(|source| OrderError::AccountServiceUnavailable {
            operation: op,
            source,
        })?;

        match lookup {
            Lookup::Found(account) => Ok(account),
            Lookup::NotFound => Err(OrderError::AccountNotFound {
                operation: op,
                account_id: account_id.clone(),
            }),
        }
    }

    async fn fetch_products(
        &self,
        op: &'static str,
        product_ids: &[ProductId],
    ) -> Result<Vec<Product>, OrderError> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        bounded(
            self.config.call_timeout,
            self.catalog.get_products(product_ids),
            LookupError::Timeout,
        )
        .await
        .map_err(|source| OrderError::CatalogUnavailable {
            operation: op,
            source,
        })
    }
}
