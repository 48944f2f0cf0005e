use crate::clients::{AccountClient, CatalogClient};
use crate::lifecycle::ServiceConfig;
use crate::order_service::OrderService;
use crate::order_store::{self, OrderStore};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

/// The running order system: collaborator actors, the order store and the service
/// wired on top of them.
///
/// # Architecture
///
/// - **Account actor**: CRUD over accounts, consulted to validate the buyer
/// - **Catalog actor**: CRUD over products, consulted for prices and display fields
/// - **Order store**: in-memory actor by default, or any [`OrderStore`] passed to
///   [`OrderSystem::with_store`]
///
/// # Example
///
/// ```ignore
/// let system = OrderSystem::new(&ServiceConfig::from_env()?);
///
/// let account_id = system.account_client.create_account(account).await?;
/// let product_id = system.catalog_client.create_product(product).await?;
/// let order = system
///     .order_service
///     .place_order(&account_id, &[RequestedItem::new(product_id, 2)])
///     .await?;
///
/// system.shutdown().await?;
/// ```
pub struct OrderSystem {
    /// Client for interacting with the Account actor
    pub account_client: AccountClient,

    /// Client for interacting with the Catalog actor
    pub catalog_client: CatalogClient,

    pub order_service: OrderService,

    /// Task handles for all running actors (used for graceful shutdown)
    handles: Vec<JoinHandle<()>>,
}

impl OrderSystem {
    /// Starts every actor, including the in-memory order store.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: &ServiceConfig) -> Self {
        let (store_actor, store) = order_store::memory::new(config.channel_capacity);
        let store_handle = tokio::spawn(store_actor.run());

        let mut system = Self::with_store(config, Arc::new(store));
        system.handles.push(store_handle);
        system
    }

    /// Starts the collaborator actors and wires the service to `store`.
    pub fn with_store(config: &ServiceConfig, store: Arc<dyn OrderStore>) -> Self {
        let (account_actor, account_client) = crate::account_actor::new(config.channel_capacity);
        let (catalog_actor, catalog_client) = crate::catalog_actor::new(config.channel_capacity);

        let account_handle = tokio::spawn(account_actor.run());
        let catalog_handle = tokio::spawn(catalog_actor.run());

        let order_service = OrderService::new(
            Arc::new(account_client.clone()),
            Arc::new(catalog_client.clone()),
            store,
            config.order.clone(),
        );

        Self {
            account_client,
            catalog_client,
            order_service,
            handles: vec![account_handle, catalog_handle],
        }
    }

    /// Starts the system on PostgreSQL when `database_url` is configured, otherwise
    /// on the in-memory store.
    #[cfg(feature = "postgres")]
    pub async fn connect(config: &ServiceConfig) -> Result<Self, order_store::StoreError> {
        match &config.database_url {
            Some(url) => {
                let store = order_store::PgOrderStore::connect(url).await?;
                info!("Using PostgreSQL order store");
                Ok(Self::with_store(config, Arc::new(store)))
            }
            None => Ok(Self::new(config)),
        }
    }

    /// Gracefully shuts down the entire system.
    ///
    /// Dropping the clients and the service closes every actor channel, so each actor
    /// leaves its loop. Clones of the clients or of the service held elsewhere keep
    /// their actors alive, and this call then waits for them to be dropped too.
    ///
    /// Returns the first task failure (a panicked actor), if any.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        info!("Shutting down system...");

        drop(self.order_service);
        drop(self.account_client);
        drop(self.catalog_client);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Actor task failed");
                return Err(e);
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
