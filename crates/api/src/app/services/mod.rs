//! Business operations behind the HTTP handlers, plus store wiring.
//!
//! Services own their stores as trait objects so the same router runs against the
//! in-memory stores (dev/test) or Postgres (`USE_PERSISTENT_STORES=true`).

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use catalog_core::DomainError;
use catalog_infra::{
    Database, InMemoryProductStore, InMemorySubscriptionStore, ProductStore, StoreError,
    SubscriptionStore,
};

mod products;
mod subscriptions;

pub use products::ProductService;
pub use subscriptions::SubscriptionService;

/// Error returned by every service operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::InvalidArgument(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            other => Self::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Everything the router needs. Cheap to clone.
#[derive(Clone)]
pub struct AppServices {
    pub products: ProductService,
    pub subscriptions: SubscriptionService,
}

impl AppServices {
    pub fn new(
        product_store: Arc<dyn ProductStore>,
        subscription_store: Arc<dyn SubscriptionStore>,
    ) -> Self {
        Self {
            products: ProductService::new(product_store),
            subscriptions: SubscriptionService::new(subscription_store),
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory() -> Self {
        info!("using in-memory stores");
        Self::new(
            Arc::new(InMemoryProductStore::new()),
            Arc::new(InMemorySubscriptionStore::new()),
        )
    }

    /// Postgres wiring over an already migrated database.
    pub fn persistent(db: &Database) -> Self {
        info!("using postgres stores");
        Self::new(
            Arc::new(db.product_store()),
            Arc::new(db.subscription_store()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_becomes_service_not_found() {
        let err: ServiceError = StoreError::product_not_found("abc").into();
        assert_eq!(err, ServiceError::NotFound("product with ID abc not found".to_string()));
    }

    #[test]
    fn other_store_errors_stay_wrapped() {
        let err: ServiceError = StoreError::Database("boom".to_string()).into();
        assert!(matches!(err, ServiceError::Store(StoreError::Database(_))));
    }

    #[test]
    fn domain_errors_are_invalid_arguments() {
        let err: ServiceError = DomainError::validation("subscription plan name cannot be empty").into();
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "subscription plan name cannot be empty");
    }
}
