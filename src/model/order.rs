use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

use super::{AccountId, ProductId};

/// Type-safe identifier for Orders.
///
/// Backed by a UUIDv7, so ids sort by creation time. Reading orders back in id order
/// therefore returns them oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    /// Mints a fresh, time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for OrderId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// One line of an order: a product, how many of it, and the catalog fields that
/// describe it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedProduct {
    pub product_id: ProductId,
    pub quantity: u32,
    pub name: String,
    pub description: String,
    /// Unit price at the time the order was placed.
    pub price: Decimal,
}

impl OrderedProduct {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A product and quantity as submitted by the caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl RequestedItem {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A placed order.
///
/// `total_price` is fixed when the order is assembled. Later changes to the items'
/// display fields (see enrichment) never touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub total_price: Decimal,
    pub items: Vec<OrderedProduct>,
}

impl Order {
    /// Assembles a new order with a fresh id, the current time and the computed total.
    ///
    /// The timestamp is truncated to microseconds, the resolution PostgreSQL keeps, so
    /// the value handed back to the caller is the value a later read returns.
    pub fn assemble(account_id: AccountId, items: Vec<OrderedProduct>) -> Self {
        let total_price = items.iter().map(OrderedProduct::line_total).sum();
        Self {
            id: OrderId::new(),
            account_id,
            created_at: Utc::now().trunc_subsecs(6),
            total_price,
            items,
        }
    }

    /// Sum of `price * quantity` over the current items.
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(OrderedProduct::line_total).sum()
    }

    pub fn product_ids(&self) -> impl Iterator<Item = &ProductId> {
        self.items.iter().map(|item| &item.product_id)
    }
}
