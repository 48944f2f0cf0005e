//! # Order Store
//!
//! Persistence for placed orders. An order is kept as one header row plus one row per
//! line item, and read back with a single joined query that is folded into
//! [`Order`] aggregates (see [`join`]).
//!
//! Two backends implement [`OrderStore`]:
//! - [`MemoryOrderStore`]: an actor owning both tables in memory (default).
//! - `PgOrderStore`: PostgreSQL through `sqlx`, behind the `postgres` feature.

pub mod error;
pub mod join;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::*;
pub use memory::MemoryOrderStore;
#[cfg(feature = "postgres")]
pub use postgres::PgOrderStore;

use crate::model::{AccountId, Order, OrderId};
use async_trait::async_trait;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Writes the header and every item row as one atomic unit. On error nothing of
    /// the order is visible to readers.
    async fn put_order(&self, order: &Order) -> Result<(), StoreError>;

    /// All orders of one account, oldest first. Orders without items are omitted.
    async fn get_orders_for_account(&self, account_id: &AccountId) -> Result<Vec<Order>, StoreError>;

    /// Removes the order and its item rows. Missing ids yield [`StoreError::NotFound`].
    async fn delete_order(&self, order_id: &OrderId) -> Result<(), StoreError>;
}
