use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use catalog_core::DetailId;
use catalog_products::{
    DigitalProduct, PhysicalProduct, Product, ProductDetails, ProductPatch,
    SubscriptionProductDetails,
};
use catalog_subscriptions::{PlanFields, SubscriptionPlan};

use crate::app::services::ServiceError;

// -------------------------
// Product payloads
// -------------------------
// `id` is output only: detail ids are always assigned by the server.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalProductDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DetailId>,
    pub file_size: i32,
    pub download_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalProductDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DetailId>,
    pub weight: f64,
    pub dimensions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionProductDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DetailId>,
    pub subscription_period: String,
    pub renewal_price: f64,
}

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /products`. At most one of the three detail payloads may be set.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub digital_product: Option<DigitalProductDto>,
    #[serde(default)]
    pub physical_product: Option<PhysicalProductDto>,
    #[serde(default)]
    pub subscription_product: Option<SubscriptionProductDto>,
}

impl CreateProductRequest {
    /// Resolve the detail payloads into a single [`ProductDetails`]. The detail id is left
    /// nil for [`Product::new`] to assign; any id in the payload is dropped.
    pub fn details(&self) -> Result<ProductDetails, ServiceError> {
        let set = [
            self.digital_product.is_some(),
            self.physical_product.is_some(),
            self.subscription_product.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        if set > 1 {
            return Err(ServiceError::InvalidArgument(
                "only one of digital_product, physical_product or subscription_product may be set"
                    .to_string(),
            ));
        }

        let details = if let Some(d) = &self.digital_product {
            ProductDetails::Digital(DigitalProduct {
                id: DetailId::nil(),
                file_size: d.file_size,
                download_link: d.download_link.clone(),
            })
        } else if let Some(p) = &self.physical_product {
            ProductDetails::Physical(PhysicalProduct {
                id: DetailId::nil(),
                weight: p.weight,
                dimensions: p.dimensions.clone(),
            })
        } else if let Some(s) = &self.subscription_product {
            ProductDetails::Subscription(SubscriptionProductDetails {
                id: DetailId::nil(),
                subscription_period: s.subscription_period.clone(),
                renewal_price: s.renewal_price,
            })
        } else {
            ProductDetails::None
        };
        Ok(details)
    }

    pub fn into_product(self, now: DateTime<Utc>) -> Result<Product, ServiceError> {
        let details = self.details()?;
        Ok(Product::new(self.name, self.description, self.price, details, now))
    }
}

/// Body of `PUT /products/:id`. Detail payloads are ignored: details are fixed at creation.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Decimal,
}

impl From<UpdateProductRequest> for ProductPatch {
    fn from(req: UpdateProductRequest) -> Self {
        ProductPatch {
            name: req.name,
            description: req.description,
            price: req.price,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub plan_name: String,
    #[serde(default)]
    pub duration_days: i32,
    #[serde(default)]
    pub price: Decimal,
}

impl CreateSubscriptionRequest {
    pub fn fields(&self) -> PlanFields {
        PlanFields {
            plan_name: self.plan_name.clone(),
            duration_days: self.duration_days,
            price: self.price,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubscriptionPlanRequest {
    #[serde(default)]
    pub plan_name: String,
    #[serde(default)]
    pub duration_days: i32,
    #[serde(default)]
    pub price: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSubscriptionPlansQuery {
    pub product_id: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// Wire form of a product. Whichever detail record the product owns is projected; the
/// other two payloads are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digital_product: Option<DigitalProductDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_product: Option<PhysicalProductDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_product: Option<SubscriptionProductDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        let mut resp = ProductResponse {
            id: p.id.to_string(),
            name: p.name,
            description: p.description,
            price: p.price,
            digital_product: None,
            physical_product: None,
            subscription_product: None,
            created_at: p.created_at,
            updated_at: p.updated_at,
        };
        match p.details {
            ProductDetails::None => {}
            ProductDetails::Digital(d) => {
                resp.digital_product = Some(DigitalProductDto {
                    id: Some(d.id),
                    file_size: d.file_size,
                    download_link: d.download_link,
                })
            }
            ProductDetails::Physical(ph) => {
                resp.physical_product = Some(PhysicalProductDto {
                    id: Some(ph.id),
                    weight: ph.weight,
                    dimensions: ph.dimensions,
                })
            }
            ProductDetails::Subscription(s) => {
                resp.subscription_product = Some(SubscriptionProductDto {
                    id: Some(s.id),
                    subscription_period: s.subscription_period,
                    renewal_price: s.renewal_price,
                })
            }
        }
        resp
    }
}

#[derive(Debug, Serialize)]
pub struct ListProductsResponse {
    pub products: Vec<ProductResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPlanResponse {
    pub id: String,
    pub product_id: String,
    pub plan_name: String,
    pub duration_days: i32,
    pub price: Decimal,
}

impl From<SubscriptionPlan> for SubscriptionPlanResponse {
    fn from(plan: SubscriptionPlan) -> Self {
        Self {
            id: plan.id.to_string(),
            product_id: plan.product_id.to_string(),
            plan_name: plan.plan_name,
            duration_days: plan.duration_days,
            price: plan.price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateSubscriptionResponse {
    pub subscription_plan: SubscriptionPlanResponse,
}

#[derive(Debug, Serialize)]
pub struct ListSubscriptionPlansResponse {
    pub subscription_plans: Vec<SubscriptionPlanResponse>,
}
