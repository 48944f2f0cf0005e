//! Reassembly of joined `orders x order_products` rows into [`Order`] aggregates.
//!
//! Both backends produce one [`OrderRow`] per (order, item) pair, with a header-only
//! row (`item: None`) for an order that has no items, the shape of a `LEFT JOIN`.

use crate::model::{AccountId, Order, OrderId, OrderedProduct, ProductId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// The item columns of a joined row.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Decimal,
}

/// One row of the joined read.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub total_price: Decimal,
    pub item: Option<ItemRow>,
}

impl OrderRow {
    fn header(&self) -> Order {
        Order {
            id: self.order_id,
            account_id: self.account_id.clone(),
            created_at: self.created_at,
            total_price: self.total_price,
            items: Vec::new(),
        }
    }
}

impl From<ItemRow> for OrderedProduct {
    // Display fields are not persisted; enrichment fills them in.
    fn from(row: ItemRow) -> Self {
        OrderedProduct {
            product_id: row.product_id,
            quantity: row.quantity,
            name: String::new(),
            description: String::new(),
            price: row.price,
        }
    }
}

/// Folds rows that are already contiguous per order id into aggregates.
///
/// A new aggregate starts whenever the order id changes. Item order within an
/// aggregate follows row order. Groups that end up without items are dropped.
pub fn group_rows(rows: impl IntoIterator<Item = OrderRow>) -> Vec<Order> {
    let grouped = rows.into_iter().fold(Vec::<Order>::new(), |mut orders, row| {
        let starts_group = orders.last().map_or(true, |current| current.id != row.order_id);
        if starts_group {
            orders.push(row.header());
        }
        if let (Some(item), Some(current)) = (row.item, orders.last_mut()) {
            current.items.push(item.into());
        }
        orders
    });

    grouped
        .into_iter()
        .filter(|order| !order.items.is_empty())
        .collect()
}

/// Like [`group_rows`] for sources that do not guarantee contiguous order ids. Rows
/// are stably sorted by order id first, so item order within an order is kept.
pub fn group_unsorted(mut rows: Vec<OrderRow>) -> Vec<Order> {
    rows.sort_by_key(|row| row.order_id);
    group_rows(rows)
}
