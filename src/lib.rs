//! # Order Recipe
//!
//! > **Order placement and retrieval on top of resource-oriented actors.**
//!
//! The order subsystem validates an account, prices the requested items against a
//! product catalog, stores the order header and its lines in one atomic write, and
//! rebuilds orders from a joined read. Accounts and products are plain CRUD services
//! built on the generic actor framework in [`framework`].
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Actors for state, traits for seams
//! Each collaborator service is a `ResourceActor<T>`: one task owns its table and
//! handles messages sequentially, so no locks are needed. The order service only sees
//! the [`AccountLookup`](clients::AccountLookup), [`CatalogLookup`](clients::CatalogLookup)
//! and [`OrderStore`](order_store::OrderStore) traits, so tests can replace any of them.
//!
//! ### Tagged lookups
//! A lookup that reached the service answers with [`Lookup::Found`](clients::Lookup::Found)
//! or [`Lookup::NotFound`](clients::Lookup::NotFound). Transport failure is an error of
//! its own, so "no such account" is never confused with "could not ask".
//!
//! ### Batch calls only
//! Placing an order makes exactly one catalog call; so does reading any number of
//! orders back.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Each layer has its own `thiserror` enum. [`OrderError`](order_service::OrderError)
//! names the failing operation, keeps the underlying cause as its `source()`, and says
//! whether a retry can help.
//!
//! ### 2. Concurrency Model
//! Account and catalog lookups for one order run concurrently. Every outbound call is
//! bounded by the configured timeout. Dropping a `place_order` future cancels its
//! sub-calls; persistence is a single atomic step, so no partial order is ever stored.
//!
//! ### 3. Observability
//! `tracing` everywhere with structured fields. See [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! - **Key items**: [`ActorEntity`](framework::ActorEntity), [`ResourceActor`](framework::ResourceActor), [`mock`](framework::mock).
//!
//! ### 2. The Collaborators ([`account_actor`], [`catalog_actor`], [`clients`])
//! - **Role**: CRUD actors plus typed clients that implement the lookup traits.
//!
//! ### 3. The Order Subsystem ([`order_service`], [`order_store`])
//! - **Key items**: [`OrderService`](order_service::OrderService), [`OrderEnricher`](order_service::OrderEnricher), [`join::group_rows`](order_store::join::group_rows).
//!
//! ### 4. The Orchestrator ([`lifecycle`])
//! - **Key items**: [`OrderSystem`](lifecycle::OrderSystem), [`ServiceConfig`](lifecycle::ServiceConfig).
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo with info logs
//! RUST_LOG=info cargo run
//!
//! # Run against PostgreSQL
//! DATABASE_URL=postgres://localhost/orders cargo run --features postgres
//!
//! # Tests
//! cargo test
//! ```

pub mod account_actor;
pub mod catalog_actor;
pub mod clients;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod order_service;
pub mod order_store;
