//! Type-safe wrappers around [`ResourceClient`](crate::framework::ResourceClient),
//! and the lookup traits the order service depends on.

pub mod account_client;
pub mod actor_client;
pub mod catalog_client;
pub mod lookup;

pub use account_client::*;
pub use actor_client::*;
pub use catalog_client::*;
pub use lookup::*;
