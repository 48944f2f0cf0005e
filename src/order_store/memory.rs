//! In-memory order store.
//!
//! A single actor task owns the `orders` headers and the `order_products` rows and
//! handles one request at a time. That sequencing is what makes a `put_order`
//! atomic: every item row is staged and checked before anything is inserted, and no
//! other request can observe the tables in between.
//!
//! Item rows are keyed by order id and headers are indexed by account, so a read
//! touches only the orders of the requested account.

use super::join::{group_unsorted, ItemRow, OrderRow};
use super::{OrderStore, StoreError};
use crate::model::{AccountId, Order, OrderId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap, HashSet};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
struct OrderHeader {
    account_id: AccountId,
    created_at: DateTime<Utc>,
    total_price: Decimal,
}

#[derive(Debug)]
enum StoreRequest {
    Put {
        order: Order,
        respond_to: oneshot::Sender<Result<(), StoreError>>,
    },
    ForAccount {
        account_id: AccountId,
        respond_to: oneshot::Sender<Vec<OrderRow>>,
    },
    Delete {
        order_id: OrderId,
        respond_to: oneshot::Sender<Result<(), StoreError>>,
    },
}

/// The actor half. Spawn [`MemoryStoreActor::run`] on the runtime.
pub struct MemoryStoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    orders: HashMap<OrderId, OrderHeader>,
    // Item rows in position order.
    order_products: HashMap<OrderId, Vec<ItemRow>>,
    by_account: HashMap<AccountId, BTreeSet<OrderId>>,
}

/// Creates the store actor and its client.
pub fn new(buffer_size: usize) -> (MemoryStoreActor, MemoryOrderStore) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let actor = MemoryStoreActor {
        receiver,
        orders: HashMap::new(),
        order_products: HashMap::new(),
        by_account: HashMap::new(),
    };
    (actor, MemoryOrderStore { sender })
}

impl MemoryStoreActor {
    pub async fn run(mut self) {
        info!("Order store started");
        while let Some(request) = self.receiver.recv().await {
            match request {
                StoreRequest::Put { order, respond_to } => {
                    // The caller gave up before the write started.
                    if respond_to.is_closed() {
                        debug!(order_id = %order.id, "Caller gone, order not stored");
                        continue;
                    }
                    let result = self.put(order);
                    let _ = respond_to.send(result);
                }
                StoreRequest::ForAccount {
                    account_id,
                    respond_to,
                } => {
                    let rows = self.joined_rows(&account_id);
                    debug!(%account_id, rows = rows.len(), "Read orders");
                    let _ = respond_to.send(rows);
                }
                StoreRequest::Delete {
                    order_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.delete(order_id));
                }
            }
        }
        info!(
            orders = self.orders.len(),
            items = self.order_products.values().map(Vec::len).sum::<usize>(),
            "Order store shutdown"
        );
    }

    fn put(&mut self, order: Order) -> Result<(), StoreError> {
        let staged = self.stage(&order).inspect_err(|e| {
            warn!(order_id = %order.id, error = %e, "Order rejected");
        })?;

        let items = staged.len();
        self.by_account
            .entry(order.account_id.clone())
            .or_default()
            .insert(order.id);
        self.orders.insert(
            order.id,
            OrderHeader {
                account_id: order.account_id,
                created_at: order.created_at,
                total_price: order.total_price,
            },
        );
        self.order_products.insert(order.id, staged);
        info!(order_id = %order.id, items, "Order stored");
        Ok(())
    }

    /// Builds the item rows for `order` and checks every constraint the tables carry.
    fn stage(&self, order: &Order) -> Result<Vec<ItemRow>, StoreError> {
        if self.orders.contains_key(&order.id) {
            return Err(StoreError::DuplicateOrder(order.id));
        }
        if order.items.is_empty() {
            return Err(StoreError::EmptyOrder(order.id));
        }

        let mut seen = HashSet::with_capacity(order.items.len());
        order
            .items
            .iter()
            .map(|item| {
                if item.quantity == 0 {
                    return Err(StoreError::InvalidQuantity {
                        order_id: order.id,
                        product_id: item.product_id.clone(),
                    });
                }
                if !seen.insert(&item.product_id) {
                    return Err(StoreError::DuplicateItem {
                        order_id: order.id,
                        product_id: item.product_id.clone(),
                    });
                }
                Ok(ItemRow {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    price: item.price,
                })
            })
            .collect()
    }

    /// Rows in the shape of `orders LEFT JOIN order_products`, ordered by order id.
    fn joined_rows(&self, account_id: &AccountId) -> Vec<OrderRow> {
        let Some(order_ids) = self.by_account.get(account_id) else {
            return Vec::new();
        };
        let mut rows = Vec::new();
        for order_id in order_ids {
            let Some(header) = self.orders.get(order_id) else {
                continue;
            };
            let row = |item| OrderRow {
                order_id: *order_id,
                account_id: header.account_id.clone(),
                created_at: header.created_at,
                total_price: header.total_price,
                item,
            };
            match self.order_products.get(order_id) {
                Some(items) if !items.is_empty() => {
                    rows.extend(items.iter().cloned().map(|item| row(Some(item))));
                }
                _ => rows.push(row(None)),
            }
        }
        rows
    }

    fn delete(&mut self, order_id: OrderId) -> Result<(), StoreError> {
        let Some(header) = self.orders.remove(&order_id) else {
            warn!(%order_id, "Order not found");
            return Err(StoreError::NotFound(order_id));
        };
        self.order_products.remove(&order_id);
        if let Some(ids) = self.by_account.get_mut(&header.account_id) {
            ids.remove(&order_id);
            if ids.is_empty() {
                self.by_account.remove(&header.account_id);
            }
        }
        info!(%order_id, "Order deleted");
        Ok(())
    }
}

/// Cloneable handle to the in-memory store actor.
#[derive(Clone)]
pub struct MemoryOrderStore {
    sender: mpsc::Sender<StoreRequest>,
}

impl MemoryOrderStore {
    async fn call<R>(
        &self,
        request: impl FnOnce(oneshot::Sender<R>) -> StoreRequest,
    ) -> Result<R, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(request(respond_to))
            .await
            .map_err(|_| StoreError::Unavailable("order store closed".to_string()))?;
        response
            .await
            .map_err(|_| StoreError::Unavailable("order store dropped the reply".to_string()))
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    #[instrument(skip(self, order), fields(order_id = %order.id, items = order.items.len()))]
    async fn put_order(&self, order: &Order) -> Result<(), StoreError> {
        let order = order.clone();
        self.call(|respond_to| StoreRequest::Put { order, respond_to })
            .await?
    }

    #[instrument(skip(self), fields(account_id = %account_id))]
    async fn get_orders_for_account(&self, account_id: &AccountId) -> Result<Vec<Order>, StoreError> {
        let account_id = account_id.clone();
        let rows = self
            .call(|respond_to| StoreRequest::ForAccount {
                account_id,
                respond_to,
            })
            .await?;
        Ok(group_unsorted(rows))
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn delete_order(&self, order_id: &OrderId) -> Result<(), StoreError> {
        let order_id = *order_id;
        self.call(|respond_to| StoreRequest::Delete {
            order_id,
            respond_to,
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderedProduct, ProductId};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn start() -> MemoryOrderStore {
        let (actor, store) = new(8);
        tokio::spawn(actor.run());
        store
    }

    fn item(id: &str, quantity: u32, price: Decimal) -> OrderedProduct {
        OrderedProduct {
            product_id: ProductId::from(id),
            quantity,
            name: id.to_string(),
            description: format!("{id} description"),
            price,
        }
    }

    fn order(account: &str, items: Vec<OrderedProduct>) -> Order {
        Order::assemble(AccountId::from(account), items)
    }

    #[tokio::test]
    async fn test_put_then_read_back() {
        let store = start();
        let placed = order("acc_1", vec![item("P1", 2, dec!(10.0)), item("P2", 4, dec!(2.5))]);

        store.put_order(&placed).await.unwrap();
        let orders = store
            .get_orders_for_account(&AccountId::from("acc_1"))
            .await
            .unwrap();

        assert_eq!(orders.len(), 1);
        let read = &orders[0];
        assert_eq!(read.id, placed.id);
        assert_eq!(read.total_price, dec!(30.0));
        assert_eq!(read.created_at, placed.created_at);
        let lines: Vec<(&str, u32)> = read
            .items
            .iter()
            .map(|i| (i.product_id.as_str(), i.quantity))
            .collect();
        assert_eq!(lines, vec![("P1", 2), ("P2", 4)]);
    }

    #[tokio::test]
    async fn test_duplicate_item_leaves_nothing_behind() {
        let store = start();
        let bad = order(
            "acc_1",
            vec![
                item("P1", 1, dec!(1)),
                item("P2", 1, dec!(1)),
                item("P1", 3, dec!(1)),
            ],
        );

        let result = store.put_order(&bad).await;

        assert!(matches!(
            result,
            Err(StoreError::DuplicateItem { ref product_id, .. }) if product_id.as_str() == "P1"
        ));
        let orders = store
            .get_orders_for_account(&AccountId::from("acc_1"))
            .await
            .unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected() {
        let store = start();
        let bad = order("acc_1", vec![item("P1", 1, dec!(1)), item("P2", 0, dec!(1))]);

        let result = store.put_order(&bad).await;

        assert!(matches!(result, Err(StoreError::InvalidQuantity { .. })));
        assert!(store
            .get_orders_for_account(&AccountId::from("acc_1"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_same_order_twice_is_rejected() {
        let store = start();
        let placed = order("acc_1", vec![item("P1", 1, dec!(1))]);

        store.put_order(&placed).await.unwrap();
        let again = store.put_order(&placed).await;

        assert!(matches!(again, Err(StoreError::DuplicateOrder(id)) if id == placed.id));
    }

    #[tokio::test]
    async fn test_reads_are_scoped_to_account_and_sorted() {
        let store = start();
        let first = order("acc_1", vec![item("P1", 1, dec!(1))]);
        let other = order("acc_2", vec![item("P1", 1, dec!(1))]);
        let second = order("acc_1", vec![item("P2", 1, dec!(1))]);

        // Insert out of creation order.
        store.put_order(&second).await.unwrap();
        store.put_order(&other).await.unwrap();
        store.put_order(&first).await.unwrap();

        let ids: Vec<OrderId> = store
            .get_orders_for_account(&AccountId::from("acc_1"))
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_reports_missing() {
        let store = start();
        let placed = order("acc_1", vec![item("P1", 1, dec!(1))]);
        store.put_order(&placed).await.unwrap();

        store.delete_order(&placed.id).await.unwrap();
        let missing = store.delete_order(&placed.id).await;

        assert!(matches!(missing, Err(StoreError::NotFound(id)) if id == placed.id));
        assert!(store
            .get_orders_for_account(&AccountId::from("acc_1"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_put_is_not_applied() {
        let (actor, store) = new(8);
        let placed = order("acc_1", vec![item("P1", 1, dec!(1))]);

        // Nothing drains the queue yet, so the put is enqueued and then abandoned.
        let abandoned = tokio::time::timeout(Duration::from_millis(20), store.put_order(&placed)).await;
        assert!(abandoned.is_err());
        tokio::spawn(actor.run());

        assert!(store
            .get_orders_for_account(&AccountId::from("acc_1"))
            .await
            .unwrap()
            .is_empty());
        // The skipped write left no trace, so the same order can still be stored.
        store.put_order(&placed).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_keeps_other_orders_of_account() {
        let store = start();
        let kept = order("acc_1", vec![item("P1", 1, dec!(1))]);
        let removed = order("acc_1", vec![item("P2", 2, dec!(3))]);
        store.put_order(&kept).await.unwrap();
        store.put_order(&removed).await.unwrap();

        store.delete_order(&removed.id).await.unwrap();

        let orders = store
            .get_orders_for_account(&AccountId::from("acc_1"))
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, kept.id);
        assert_eq!(orders[0].items[0].product_id.as_str(), "P1");
    }

    #[tokio::test]
    async fn test_closed_store_is_unavailable() {
        let (actor, store) = new(1);
        drop(actor);

        let result = store
            .get_orders_for_account(&AccountId::from("acc_1"))
            .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
