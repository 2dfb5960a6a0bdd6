use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use catalog_core::ProductId;

use crate::app::extract::JsonBody;
use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<dto::CreateProductRequest>,
) -> axum::response::Response {
    let product = match body.into_product(Utc::now()) {
        Ok(p) => p,
        Err(e) => return errors::service_error_to_response(e),
    };

    match services.products.create_product(product).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(dto::ProductResponse::from(created)),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.get_product_by_id(id).await {
        Ok(p) => Json(dto::ProductResponse::from(p)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<dto::UpdateProductRequest>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.update_product(id, body.into()).await {
        Ok(p) => Json(dto::ProductResponse::from(p)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.delete_product(id).await {
        Ok(()) => Json(serde_json::json!({})).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListProductsQuery>,
) -> axum::response::Response {
    match services.products.list_products(&query.kind).await {
        Ok(products) => Json(dto::ListProductsResponse {
            products: products.into_iter().map(dto::ProductResponse::from).collect(),
        })
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
