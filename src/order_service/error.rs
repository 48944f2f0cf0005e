//! Error types for the order service.
//!
//! Every variant names the service operation it came from, and wraps the underlying
//! lookup or store error as its `source()` where there is one.

use crate::clients::LookupError;
use crate::model::{AccountId, OrderId};
use crate::order_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{operation}: invalid request: {reason}")]
    InvalidRequest {
        operation: &'static str,
        reason: String,
    },

    #[error("{operation}: account {account_id} not found")]
    AccountNotFound {
        operation: &'static str,
        account_id: AccountId,
    },

    /// Nothing orderable remained after dropping unknown products and zero quantities.
    #[error("{operation}: no valid items in the order")]
    NoValidItems { operation: &'static str },

    #[error("{operation}: account service unavailable")]
    AccountServiceUnavailable {
        operation: &'static str,
        #[source]
        source: LookupError,
    },

    #[error("{operation}: catalog unavailable")]
    CatalogUnavailable {
        operation: &'static str,
        #[source]
        source: LookupError,
    },

    #[error("{operation}: persistence failure")]
    PersistenceFailure {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("{operation}: order {order_id} not found")]
    OrderNotFound {
        operation: &'static str,
        order_id: OrderId,
    },
}

impl OrderError {
    /// Name of the service operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            OrderError::InvalidRequest { operation, .. }
            | OrderError::AccountNotFound { operation, .. }
            | OrderError::NoValidItems { operation }
            | OrderError::AccountServiceUnavailable { operation, .. }
            | OrderError::CatalogUnavailable { operation, .. }
            | OrderError::PersistenceFailure { operation, .. }
            | OrderError::OrderNotFound { operation, .. } => *operation,
        }
    }

    /// Whether the same request may succeed if sent again later.
    ///
    /// A write that timed out is not retryable: it may already have been applied,
    /// and sending it again could store the order twice.
    pub fn is_retryable(&self) -> bool {
        match self {
            OrderError::AccountServiceUnavailable { .. } | OrderError::CatalogUnavailable { .. } => true,
            OrderError::PersistenceFailure { source, .. } => matches!(
                source,
                StoreError::Timeout(_) | StoreError::Unavailable(_)
            ),
            _ => false,
        }
    }

    /// Whether the caller's request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            OrderError::InvalidRequest { .. }
                | OrderError::AccountNotFound { .. }
                | OrderError::NoValidItems { .. }
                | OrderError::OrderNotFound { .. }
        )
    }
}
