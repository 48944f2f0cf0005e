//! Pure data structures (DTOs) shared by the services.
//!
//! [`Account`] and [`Product`] implement the [`ActorEntity`](crate::framework::ActorEntity)
//! trait in their actor modules. [`Order`] is an immutable aggregate owned by the
//! order store.

pub mod account;
pub mod order;
pub mod product;

pub use account::*;
pub use order::*;
pub use product::*;
