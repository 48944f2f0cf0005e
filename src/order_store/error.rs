//! Error types for the order store.

use crate::model::{OrderId, ProductId};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order {0} already exists")]
    DuplicateOrder(OrderId),

    /// The same product appears twice in one order.
    #[error("order {order_id} lists product {product_id} more than once")]
    DuplicateItem {
        order_id: OrderId,
        product_id: ProductId,
    },

    #[error("order {order_id} has an invalid quantity for product {product_id}")]
    InvalidQuantity {
        order_id: OrderId,
        product_id: ProductId,
    },

    #[error("order {0} has no items")]
    EmptyOrder(OrderId),

    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("corrupt row: {0}")]
    CorruptRow(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    /// A write ran past its deadline. It may or may not have been applied.
    #[error("store write outcome unknown after {0:?}")]
    WriteTimedOut(Duration),

    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
