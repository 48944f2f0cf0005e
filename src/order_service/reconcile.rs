//! Turning requested items into priced order lines.

use crate::model::{OrderedProduct, Product, ProductId, RequestedItem};
use std::collections::{HashMap, HashSet};

/// Distinct product ids in first-seen order.
pub fn distinct_product_ids(items: &[RequestedItem]) -> Vec<ProductId> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .filter(|item| seen.insert(&item.product_id))
        .map(|item| item.product_id.clone())
        .collect()
}

/// Prices the requested items against the catalog records that were found.
///
/// Repeated product ids are merged by summing their quantities. Lines whose product
/// has no catalog record, or whose merged quantity is zero, are dropped. Output order
/// follows the first occurrence of each product in the request.
pub fn reconcile(requested: &[RequestedItem], catalog: &[Product]) -> Vec<OrderedProduct> {
    let by_id: HashMap<&ProductId, &Product> = catalog.iter().map(|p| (&p.id, p)).collect();
    let mut quantities: HashMap<&ProductId, u32> = HashMap::new();
    for item in requested {
        let total = quantities.entry(&item.product_id).or_insert(0);
        *total = total.saturating_add(item.quantity);
    }

    distinct_product_ids(requested)
        .into_iter()
        .filter_map(|id| {
            let quantity = quantities.get(&id).copied().unwrap_or(0);
            let product = by_id.get(&id)?;
            (quantity > 0).then(|| OrderedProduct {
                product_id: id,
                quantity,
                name: product.name.clone(),
                description: product.description.clone(),
                price: product.price,
            })
        })
        .collect()
}
