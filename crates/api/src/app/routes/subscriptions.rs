//! Subscription plan handlers.
//!
//! Status rules differ per call: product lookups during creation answer 404, plan reads
//! answer 404 on any failure, listing and deletion answer 500 on any failure.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::warn;

use catalog_core::{ProductId, SubscriptionPlanId};
use catalog_subscriptions::{round_price, PlanFields};

use crate::app::services::{AppServices, ServiceError};
use crate::app::extract::JsonBody;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_subscription).get(list_subscription_plans))
        .route(
            "/:id",
            get(get_subscription_plan)
                .put(update_subscription_plan)
                .delete(delete_subscription),
        )
}

pub async fn create_subscription(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<dto::CreateSubscriptionRequest>,
) -> axum::response::Response {
    let product = match services.products.find_product_by_id(&body.product_id).await {
        Ok(p) => p,
        Err(e) => {
            warn!(product_id = %body.product_id, error = %e, "product lookup failed");
            return errors::not_found(format!("product not found: {e}"));
        }
    };

    match services
        .subscriptions
        .create_subscription_plan(product.id, body.fields())
        .await
    {
        Ok(plan) => (
            StatusCode::CREATED,
            Json(dto::CreateSubscriptionResponse {
                subscription_plan: plan.into(),
            }),
        )
            .into_response(),
        Err(e @ ServiceError::InvalidArgument(_)) => errors::service_error_to_response(e),
        Err(e) => errors::not_found(e.to_string()),
    }
}

pub async fn get_subscription_plan(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SubscriptionPlanId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.subscriptions.get_subscription_plan_by_id(id).await {
        Ok(plan) => Json(dto::SubscriptionPlanResponse::from(plan)).into_response(),
        Err(e) => {
            warn!(plan_id = %id, error = %e, "subscription plan lookup failed");
            errors::not_found("subscription plan not found")
        }
    }
}

/// Lists every plan, or only those of `?product_id=`.
pub async fn list_subscription_plans(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListSubscriptionPlansQuery>,
) -> axum::response::Response {
    let product_filter = match query.product_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match errors::parse_id::<ProductId>(raw) {
            Ok(id) => Some(id),
            Err(resp) => return resp,
        },
    };

    let result = match product_filter {
        Some(product_id) => services.subscriptions.list_plans_for_product(product_id).await,
        None => services.subscriptions.list_subscription_plans().await,
    };

    match result {
        Ok(plans) => Json(dto::ListSubscriptionPlansResponse {
            subscription_plans: plans
                .into_iter()
                .map(dto::SubscriptionPlanResponse::from)
                .collect(),
        })
        .into_response(),
        Err(e) => errors::internal(format!("error fetching subscription plans: {e}")),
    }
}

/// The incoming price is rounded to cents before validation and persistence.
pub async fn update_subscription_plan(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<dto::UpdateSubscriptionPlanRequest>,
) -> axum::response::Response {
    let id: SubscriptionPlanId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let fields = PlanFields {
        plan_name: body.plan_name,
        duration_days: body.duration_days,
        price: round_price(body.price),
    };

    match services.subscriptions.update_subscription_plan(id, fields).await {
        Ok(plan) => Json(dto::SubscriptionPlanResponse::from(plan)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_subscription(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SubscriptionPlanId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.subscriptions.delete_subscription_plan(id).await {
        Ok(()) => Json(serde_json::json!({})).into_response(),
        Err(e) => errors::internal(format!("failed to delete subscription plan: {e}")),
    }
}
