//! # Catalog Client
//!
//! High-level API for the catalog actor. Besides CRUD it implements
//! [`CatalogLookup`], resolving any number of product ids with one `get_many` request.

use crate::catalog_actor::CatalogError;
use crate::clients::actor_client::ActorClient;
use crate::clients::lookup::{CatalogLookup, LookupError};
use crate::framework::{FrameworkError, ResourceClient};
use crate::model::{Product, ProductCreate, ProductId, ProductUpdate};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with the Catalog actor.
#[derive(Clone)]
pub struct CatalogClient {
    inner: ResourceClient<Product>,
}

impl CatalogClient {
    pub fn new(inner: ResourceClient<Product>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<Product> for CatalogClient {
    type Error = CatalogError;

    fn inner(&self) -> &ResourceClient<Product> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::NotFound(id) => CatalogError::NotFound(id),
            FrameworkError::EntityError(inner) => CatalogError::ValidationError(inner.to_string()),
            other => CatalogError::ActorCommunicationError(other.to_string()),
        }
    }
}

impl CatalogClient {
    #[instrument(skip(self))]
    pub async fn create_product(&self, params: ProductCreate) -> Result<ProductId, CatalogError> {
        debug!("Sending request");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, CatalogError> {
        debug!("Sending request");
        self.inner.update(id, update).await.map_err(Self::map_error)
    }
}

#[async_trait]
impl CatalogLookup for CatalogClient {
    #[instrument(skip(self), fields(requested = ids.len()))]
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, LookupError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Fetching products");
        self.inner
            .get_many(ids.to_vec())
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))
    }
}
