use axum::Router;

pub mod products;
pub mod subscriptions;
pub mod system;

/// Router for the catalog resources.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/subscriptions", subscriptions::router())
}
