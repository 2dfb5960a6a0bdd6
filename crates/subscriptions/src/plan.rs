use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use catalog_core::{DomainError, DomainResult, Entity, ProductId, SubscriptionPlanId};

/// Number of decimal places plan prices are stored with.
pub const PRICE_SCALE: u32 = 2;

/// Round a plan price to cents, midpoint away from zero (`19.995 -> 20.00`).
pub fn round_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// The caller-supplied fields of a plan (everything except the ids).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFields {
    pub plan_name: String,
    pub duration_days: i32,
    pub price: Decimal,
}

impl PlanFields {
    pub fn validate(&self) -> DomainResult<()> {
        if self.plan_name.trim().is_empty() {
            return Err(DomainError::validation("subscription plan name cannot be empty"));
        }
        if self.duration_days <= 0 {
            return Err(DomainError::validation(
                "subscription plan duration must be greater than zero",
            ));
        }
        if self.price <= Decimal::ZERO {
            return Err(DomainError::validation(
                "subscription plan price must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// A pricing/duration offer for a product. Duration is expressed in days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub id: SubscriptionPlanId,
    pub product_id: ProductId,
    pub plan_name: String,
    pub duration_days: i32,
    pub price: Decimal,
}

impl SubscriptionPlan {
    /// Validate `fields` and build a plan with a freshly generated id.
    pub fn new(product_id: ProductId, fields: PlanFields) -> DomainResult<Self> {
        fields.validate()?;
        Ok(Self {
            id: SubscriptionPlanId::new(),
            product_id,
            plan_name: fields.plan_name,
            duration_days: fields.duration_days,
            price: fields.price,
        })
    }

    /// Validate `fields` and overwrite name, duration and price.
    ///
    /// On error the plan is left unchanged.
    pub fn apply(&mut self, fields: PlanFields) -> DomainResult<()> {
        fields.validate()?;
        self.plan_name = fields.plan_name;
        self.duration_days = fields.duration_days;
        self.price = fields.price;
        Ok(())
    }
}

impl Entity for SubscriptionPlan {
    type Id = SubscriptionPlanId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
