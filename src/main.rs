//! Demo: seeds one account and two products, places an order, reads it back,
//! deletes it and shuts the system down.
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

use anyhow::Context;
use order_recipe::clients::ActorClient;
use order_recipe::lifecycle::{setup_tracing, OrderSystem, ServiceConfig};
use order_recipe::model::{AccountCreate, ProductCreate, ProductUpdate, RequestedItem};
use rust_decimal::Decimal;
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real variables still apply.
    let _ = dotenvy::dotenv();
    setup_tracing();

    let config = ServiceConfig::from_env().context("loading configuration")?;
    info!(
        call_timeout = ?config.order.call_timeout,
        channel_capacity = config.channel_capacity,
        database = config.database_url.is_some(),
        "Starting order system"
    );

    #[cfg(feature = "postgres")]
    let system = OrderSystem::connect(&config)
        .await
        .context("connecting the order store")?;
    #[cfg(not(feature = "postgres"))]
    let system = OrderSystem::new(&config);

    let (account_id, keyboard, cable) = async {
        let account_id = system
            .account_client
            .create_account(AccountCreate {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            })
            .await?;
        let keyboard = system
            .catalog_client
            .create_product(ProductCreate {
                name: "Keyboard".to_string(),
                description: "Mechanical, 87 keys".to_string(),
                price: Decimal::new(1000, 2),
            })
            .await?;
        let cable = system
            .catalog_client
            .create_product(ProductCreate {
                name: "Cable".to_string(),
                description: "USB-C, 1m".to_string(),
                price: Decimal::new(250, 2),
            })
            .await?;
        anyhow::Ok((account_id, keyboard, cable))
    }
    .instrument(tracing::info_span!("seeding"))
    .await?;

    let order = system
        .order_service
        .place_order(
            &account_id,
            &[
                RequestedItem::new(keyboard.clone(), 2),
                RequestedItem::new(cable.clone(), 4),
                RequestedItem::new("prod_unknown", 1),
            ],
        )
        .await?;
    info!(order_id = %order.id, total = %order.total_price, items = order.items.len(), "Order placed");

    // Later catalog edits show up on reads; the order total does not change.
    system
        .catalog_client
        .update_product(
            keyboard.clone(),
            ProductUpdate {
                name: Some("Keyboard (TKL)".to_string()),
                ..Default::default()
            },
        )
        .await?;
    system.catalog_client.delete(cable).await?;

    let orders = system.order_service.get_orders_for_account(&account_id).await?;
    for order in &orders {
        for item in &order.items {
            info!(
                order_id = %order.id,
                product_id = %item.product_id,
                name = %item.name,
                quantity = item.quantity,
                price = %item.price,
                "Order line"
            );
        }
    }

    system.order_service.delete_order(&order.id).await?;
    let remaining = system.order_service.get_orders_for_account(&account_id).await?;
    info!(remaining = remaining.len(), "Order deleted");

    system.shutdown().await?;
    Ok(())
}
