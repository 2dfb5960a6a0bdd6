//! Subscription plans domain module.
//!
//! A subscription plan is a pricing/duration offer tied to a product. This crate
//! holds the plan entity and its field rules; persistence lives in `catalog-infra`.

pub mod plan;

pub use plan::{round_price, PlanFields, SubscriptionPlan};
