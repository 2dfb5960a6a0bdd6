//! Infrastructure layer: configuration, the Postgres gateway, and catalog stores.

pub mod config;
pub mod db;
pub mod store;

pub use config::{AppConfig, ConfigError, DatabaseConfig, ServerConfig};
pub use db::{Database, GatewayError};
pub use store::{
    InMemoryProductStore, InMemorySubscriptionStore, PostgresProductStore,
    PostgresSubscriptionStore, ProductStore, StoreError, SubscriptionStore,
};
