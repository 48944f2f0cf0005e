//! # Observability & Tracing
//!
//! This module provides the tracing infrastructure for the order system.
//!
//! ## Overview
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing` crate,
//! providing hierarchical spans that show the complete request flow through the system.
//!
//! ## Configuration
//!
//! The framework uses a compact format that hides the crate/module prefix (`with_target(false)`).
//! This keeps log lines short while still providing rich structured data.
//!
//! - **Structured logging** with `tracing` crate
//! - **Hierarchical spans** for request tracing
//! - **Configurable log levels** via `RUST_LOG` environment variable
//! - **Compact format** optimized for development
//!
//! ## What Gets Traced
//!
//! - **Actor Lifecycle**: Startup, shutdown, and final state
//! - **Entity Operations**: Create, Get, GetMany, List, Update, Delete
//! - **Order Workflow**: placement, reads, deletes and partial enrichment
//! - **Request Flow**: Hierarchical spans showing the complete request path
//! - **Errors**: Detailed error context with entity IDs and failure reasons
//!
//! ## Usage Examples
//!
//! ```bash
//! # Compact logs (default)
//! RUST_LOG=info cargo run
//!
//! # Show full payloads with debug logs
//! RUST_LOG=debug cargo run
//!
//! # Very verbose tracing
//! RUST_LOG=trace cargo run
//!
//! # Filter to specific modules
//! RUST_LOG=order_recipe::order_service=debug cargo run
//! ```
//!
//! ## Workflow Trace Example
//!
//! Placing an order with `RUST_LOG=info` (compact):
//!
//! ```text
//! INFO Actor started entity_type="Account"
//! INFO Actor started entity_type="Product"
//! INFO Order store started
//! INFO Created entity_type="Account" id=acc_1 size=1
//! INFO place_order: Order stored order_id=0192... items=2
//! INFO place_order: Order placed order_id=0192... items=2 dropped=0 total=30.0
//! ```
//!
//! With `RUST_LOG=debug` the lookups become visible inside the `place_order` span:
//!
//! ```text
//! DEBUG place_order:get_account: Looking up account
//! DEBUG Get entity_type="Account" id=acc_1 found=true
//! DEBUG place_order:get_products: Fetching products
//! DEBUG GetMany entity_type="Product" requested=2 found=2
//! ```
//!
//! A read that meets products removed from the catalog emits one warning:
//!
//! ```text
//! WARN get_orders_for_account:enrich: Some ordered products are no longer in the catalog event="EnrichmentPartial" missing=[ProductId("prod_2")]
//! ```
/// Installs the global subscriber. Falls back to `info` when `RUST_LOG` is unset.
pub fn setup_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false) // Don't show module paths - we use entity_type instead
        .compact() // Compact format shows spans inline (e.g., "place_order:get_account")
        .init();
}
