//! # Order Enrichment
//!
//! Orders read back from the store carry only ids, quantities and the price paid.
//! [`OrderEnricher`] fills in the current catalog fields for every line, resolving all
//! products of all orders with a single catalog call.

use super::bounded;
use crate::clients::{CatalogLookup, LookupError};
use crate::model::{Order, Product, ProductId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct OrderEnricher {
    catalog: Arc<dyn CatalogLookup>,
    call_timeout: Duration,
}

impl OrderEnricher {
    pub fn new(catalog: Arc<dyn CatalogLookup>, call_timeout: Duration) -> Self {
        Self {
            catalog,
            call_timeout,
        }
    }

    /// Overwrites `name`, `description` and `price` on every line whose product the
    /// catalog still knows. Lines without a record keep what the store returned.
    ///
    /// Never fails: when the catalog cannot be reached the orders come back as they
    /// were. `total_price` is never modified.
    #[instrument(skip(self, orders), fields(orders = orders.len()))]
    pub async fn enrich(&self, mut orders: Vec<Order>) -> Vec<Order> {
        let ids: BTreeSet<&ProductId> = orders.iter().flat_map(|order| order.product_ids()).collect();
        if ids.is_empty() {
            return orders;
        }
        let ids: Vec<ProductId> = ids.into_iter().cloned().collect();

        let products = match bounded(
            self.call_timeout,
            self.catalog.get_products(&ids),
            LookupError::Timeout,
        )
        .await
        {
            Ok(products) => products,
            Err(error) => {
                warn!(%error, requested = ids.len(), "Catalog unavailable, returning orders unenriched");
                return orders;
            }
        };

        let by_id: HashMap<&ProductId, &Product> = products.iter().map(|p| (&p.id, p)).collect();
        let missing: Vec<&ProductId> = ids.iter().filter(|id| !by_id.contains_key(id)).collect();
        if !missing.is_empty() {
            warn!(
                event = "EnrichmentPartial",
                missing = ?missing,
                "Some ordered products are no longer in the catalog"
            );
        }

        for item in orders.iter_mut().flat_map(|order| order.items.iter_mut()) {
            if let Some(product) = by_id.get(&item.product_id) {
                item.name = product.name.clone();
                item.description = product.description.clone();
                item.price = product.price;
            }
        }
        debug!(resolved = by_id.len(), "Orders enriched");
        orders
    }
}
