//! # Lookup seams
//!
//! The order service never talks to an actor directly. It depends on these two
//! traits, so tests can hand it scripted implementations and a deployment can swap
//! the in-process actors for remote services.

use crate::model::{Account, AccountId, Product, ProductId};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Outcome of a lookup that reached the service.
///
/// Absence is a normal answer, kept apart from transport failure so callers cannot
/// confuse "no such account" with "could not ask".
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Lookup::NotFound, Lookup::Found)
    }
}

/// Failure to get an answer from a collaborator service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LookupError {
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport failure: {0}")]
    Transport(String),
}

#[async_trait]
pub trait AccountLookup: Send + Sync {
    async fn get_account(&self, id: &AccountId) -> Result<Lookup<Account>, LookupError>;
}

#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Returns the records that exist for `ids`. Unknown ids are simply absent from
    /// the result. An empty `ids` slice yields an empty result.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, LookupError>;
}
