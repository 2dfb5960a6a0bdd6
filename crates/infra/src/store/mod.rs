//! Catalog stores: map products and subscription plans to and from persisted records.
//!
//! Each store is an async trait with two implementations:
//! - in-memory (tests/dev), insertion ordered
//! - Postgres, over the pool owned by [`crate::db::Database`]

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use catalog_core::{ProductId, SubscriptionPlanId};
use catalog_products::{Product, ProductKind};
use catalog_subscriptions::SubscriptionPlan;

pub use memory::{InMemoryProductStore, InMemorySubscriptionStore};
pub use postgres::{PostgresProductStore, PostgresSubscriptionStore};

/// Store operation error.
///
/// These are **infrastructure errors**; validation failures never reach a store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn product_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "product",
            id: id.to_string(),
        }
    }

    pub fn plan_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "subscription plan",
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Product persistence.
///
/// A product and its detail record are written together and read together.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Persist a new product and its detail record atomically.
    async fn create(&self, product: &Product) -> Result<(), StoreError>;

    /// Fetch a product with its detail record. Fails with `NotFound` when absent.
    async fn get_by_id(&self, id: ProductId) -> Result<Product, StoreError>;

    /// Upsert by primary key. Only name, description, price and `updated_at` change on an
    /// existing product; detail records are immutable after creation.
    async fn update(&self, product: &Product) -> Result<(), StoreError>;

    /// Remove a product (and its detail record). Returns whether a row was removed;
    /// deleting an absent product is not an error.
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;

    /// All products, or only those of `kind`, in insertion order.
    async fn list(&self, kind: Option<ProductKind>) -> Result<Vec<Product>, StoreError>;

    /// Look up a product by the text of its identifier, without parsing it first.
    async fn find_by_raw_id(&self, raw_id: &str) -> Result<Option<Product>, StoreError>;

    async fn get_all(&self) -> Result<Vec<Product>, StoreError> {
        self.list(None).await
    }

    async fn get_by_kind(&self, kind: ProductKind) -> Result<Vec<Product>, StoreError> {
        self.list(Some(kind)).await
    }
}

/// Subscription plan persistence.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert a plan with a pre-assigned id. Fails with `Conflict` if the id exists.
    async fn save(&self, plan: &SubscriptionPlan) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: SubscriptionPlanId) -> Result<SubscriptionPlan, StoreError>;

    /// Every plan referencing `product_id`, possibly none.
    async fn find_by_product_id(&self, product_id: ProductId)
    -> Result<Vec<SubscriptionPlan>, StoreError>;

    /// Fails with `NotFound` when no plan has this id.
    async fn delete(&self, id: SubscriptionPlanId) -> Result<(), StoreError>;

    /// Full-record upsert by id.
    async fn update(&self, plan: &SubscriptionPlan) -> Result<(), StoreError>;

    async fn list_all(&self) -> Result<Vec<SubscriptionPlan>, StoreError>;
}
