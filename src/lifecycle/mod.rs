//! # System Lifecycle & Orchestration
//!
//! Starting, wiring and stopping the services.
//!
//! **Key Responsibilities:**
//! 1. **Configuration** - [`ServiceConfig`] read from the environment
//! 2. **Actor Creation** - account, catalog and order-store actors with their clients
//! 3. **Dependency Injection** - clients handed to [`OrderService`](crate::order_service::OrderService) as trait objects
//! 4. **Graceful Shutdown** - drop every client, then join every actor task
//! 5. **Observability Setup** - [`setup_tracing`]

pub mod config;
pub mod order_system;
pub mod tracing;

pub use self::config::*;
pub use self::order_system::*;
pub use self::tracing::*;
