//! Entity trait implementation for the catalog [`Product`] type.
//!
//! Prices are unit prices and can never be negative, neither at creation nor after
//! an update.

use super::CatalogError;
use crate::framework::ActorEntity;
use crate::model::{Product, ProductCreate, ProductId, ProductUpdate};
use rust_decimal::Decimal;

fn check_price(price: Decimal) -> Result<(), CatalogError> {
    if price < Decimal::ZERO {
        return Err(CatalogError::ValidationError(format!(
            "price must not be negative, got {price}"
        )));
    }
    Ok(())
}

impl ActorEntity for Product {
    type Id = ProductId;
    type Create = ProductCreate;
    type Update = ProductUpdate;
    type Error = CatalogError;

    fn from_create_params(id: ProductId, params: ProductCreate) -> Result<Self, CatalogError> {
        Ok(Self::new(id, params.name, params.description, params.price))
    }

    fn on_create(&mut self) -> Result<(), CatalogError> {
        check_price(self.price)
    }

    /// Handles updates to the Product entity.
    ///
    /// # Fields Updated
    /// - `name`, `description`: display fields shown on order lines
    /// - `price`: unit price used for orders placed from now on
    fn on_update(&mut self, update: ProductUpdate) -> Result<(), CatalogError> {
        if let Some(price) = update.price {
            check_price(price)?;
            self.price = price;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        Ok(())
    }
}
