//! PostgreSQL order store using sqlx.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag.
//!
//! # Schema
//!
//! ```sql
//! orders(id UUID PRIMARY KEY, created_at TIMESTAMPTZ, account_id TEXT, total_price NUMERIC)
//! order_products(order_id UUID REFERENCES orders(id) ON DELETE CASCADE,
//!                position INT, product_id TEXT, quantity INT CHECK (quantity > 0),
//!                price NUMERIC, PRIMARY KEY (order_id, product_id))
//! ```

use super::join::{group_rows, ItemRow, OrderRow};
use super::{OrderStore, StoreError};
use crate::model::{AccountId, Order, OrderId, OrderedProduct, ProductId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use std::collections::HashSet;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// Five binds per row keeps one statement well under the 65,535 parameter limit.
const ITEMS_PER_INSERT: usize = 1_000;

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL,
        account_id TEXT NOT NULL,
        total_price NUMERIC NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS orders_account_id_idx ON orders (account_id)",
    "CREATE TABLE IF NOT EXISTS order_products (
        order_id UUID NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
        position INT NOT NULL,
        product_id TEXT NOT NULL,
        quantity INT NOT NULL CHECK (quantity > 0),
        price NUMERIC NOT NULL,
        PRIMARY KEY (order_id, product_id)
    )",
];

/// Order store backed by a PostgreSQL connection pool.
#[derive(Clone, Debug)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and makes sure both tables exist.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Creates the tables if they are missing. Safe to call repeatedly.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Translates constraint violations into the store's own error variants.
fn classify(error: sqlx::Error, order: &Order) -> StoreError {
    if let sqlx::Error::Database(db) = &error {
        if db.is_unique_violation() {
            if db.constraint() == Some("orders_pkey") {
                return StoreError::DuplicateOrder(order.id);
            }
            if let Some(product_id) = first_duplicate(&order.items) {
                return StoreError::DuplicateItem {
                    order_id: order.id,
                    product_id,
                };
            }
        }
        if db.is_check_violation() {
            if let Some(item) = order.items.iter().find(|item| item.quantity == 0) {
                return StoreError::InvalidQuantity {
                    order_id: order.id,
                    product_id: item.product_id.clone(),
                };
            }
        }
    }
    StoreError::Database(error)
}

fn first_duplicate(items: &[OrderedProduct]) -> Option<ProductId> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .find(|item| !seen.insert(&item.product_id))
        .map(|item| item.product_id.clone())
}

fn decode_row(row: &PgRow) -> Result<OrderRow, StoreError> {
    let corrupt = |e: sqlx::Error| StoreError::CorruptRow(e.to_string());
    let order_id: Uuid = row.try_get("id").map_err(corrupt)?;
    let account_id: String = row.try_get("account_id").map_err(corrupt)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(corrupt)?;
    let total_price: Decimal = row.try_get("total_price").map_err(corrupt)?;

    let product_id: Option<String> = row.try_get("product_id").map_err(corrupt)?;
    let item = match product_id {
        None => None,
        Some(product_id) => {
            let quantity: i32 = row.try_get("quantity").map_err(corrupt)?;
            let quantity = u32::try_from(quantity).map_err(|_| {
                StoreError::CorruptRow(format!(
                    "order {order_id} has negative quantity {quantity} for {product_id}"
                ))
            })?;
            Some(ItemRow {
                product_id: ProductId(product_id),
                quantity,
                price: row.try_get("price").map_err(corrupt)?,
            })
        }
    };

    Ok(OrderRow {
        order_id: OrderId(order_id),
        account_id: AccountId(account_id),
        created_at,
        total_price,
        item,
    })
}

#[async_trait]
impl OrderStore for PgOrderStore {
    #[instrument(skip(self, order), fields(order_id = %order.id, items = order.items.len()))]
    async fn put_order(&self, order: &Order) -> Result<(), StoreError> {
        if order.items.is_empty() {
            return Err(StoreError::EmptyOrder(order.id));
        }
        let mut item_rows = Vec::with_capacity(order.items.len());
        for (position, item) in order.items.iter().enumerate() {
            let invalid = || StoreError::InvalidQuantity {
                order_id: order.id,
                product_id: item.product_id.clone(),
            };
            let quantity = i32::try_from(item.quantity).map_err(|_| invalid())?;
            let position = i32::try_from(position).map_err(|_| invalid())?;
            item_rows.push((position, item.product_id.as_str().to_owned(), quantity, item.price));
        }

        // Dropping the transaction without commit rolls it back.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, created_at, account_id, total_price) VALUES ($1, $2, $3, $4)",
        )
        .bind(order.id.as_uuid())
        .bind(order.created_at)
        .bind(order.account_id.as_str())
        .bind(order.total_price)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify(e, order))?;

        for chunk in item_rows.chunks(ITEMS_PER_INSERT) {
            let mut insert = QueryBuilder::<Postgres>::new(
                "INSERT INTO order_products (order_id, position, product_id, quantity, price) ",
            );
            insert.push_values(chunk, |mut row, (position, product_id, quantity, price)| {
                row.push_bind(order.id.as_uuid())
                    .push_bind(*position)
                    .push_bind(product_id.as_str())
                    .push_bind(*quantity)
                    .push_bind(*price);
            });
            if let Err(e) = insert.build().execute(&mut *tx).await {
                let error = classify(e, order);
                warn!(error = %error, "Order rejected, rolling back");
                return Err(error);
            }
        }

        tx.commit().await?;
        info!("Order stored");
        Ok(())
    }

    #[instrument(skip(self), fields(account_id = %account_id))]
    async fn get_orders_for_account(&self, account_id: &AccountId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(
            "SELECT o.id, o.account_id, o.created_at, o.total_price, \
                    op.product_id, op.quantity, op.price \
             FROM orders o \
             LEFT JOIN order_products op ON op.order_id = o.id \
             WHERE o.account_id = $1 \
             ORDER BY o.id, op.position",
        )
        .bind(account_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
        Ok(group_rows(rows))
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn delete_order(&self, order_id: &OrderId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(*order_id));
        }
        info!("Order deleted");
        Ok(())
    }
}
