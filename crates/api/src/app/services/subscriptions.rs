use std::sync::Arc;

use tracing::{info, instrument};

use catalog_core::{ProductId, SubscriptionPlanId};
use catalog_infra::SubscriptionStore;
use catalog_subscriptions::{PlanFields, SubscriptionPlan};

use super::ServiceResult;

/// Subscription plan operations. Plan fields are validated on create and update.
#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// Callers are expected to have confirmed that `product_id` exists.
    #[instrument(skip(self, input), fields(plan_name = %input.plan_name), err)]
    pub async fn create_subscription_plan(
        &self,
        product_id: ProductId,
        input: PlanFields,
    ) -> ServiceResult<SubscriptionPlan> {
        let plan = SubscriptionPlan::new(product_id, input)?;
        self.store.save(&plan).await?;
        info!(plan_id = %plan.id, "subscription plan created");
        Ok(plan)
    }

    #[instrument(skip(self), err)]
    pub async fn get_subscription_plan_by_id(
        &self,
        id: SubscriptionPlanId,
    ) -> ServiceResult<SubscriptionPlan> {
        Ok(self.store.find_by_id(id).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn list_subscription_plans(&self) -> ServiceResult<Vec<SubscriptionPlan>> {
        Ok(self.store.list_all().await?)
    }

    #[instrument(skip(self), err)]
    pub async fn list_plans_for_product(
        &self,
        product_id: ProductId,
    ) -> ServiceResult<Vec<SubscriptionPlan>> {
        Ok(self.store.find_by_product_id(product_id).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_subscription_plan(&self, id: SubscriptionPlanId) -> ServiceResult<()> {
        self.store.delete(id).await?;
        Ok(())
    }

    /// Overwrite name, duration and price after validating them.
    #[instrument(skip(self, input), err)]
    pub async fn update_subscription_plan(
        &self,
        id: SubscriptionPlanId,
        input: PlanFields,
    ) -> ServiceResult<SubscriptionPlan> {
        let mut plan = self.store.find_by_id(id).await?;
        plan.apply(input)?;
        self.store.update(&plan).await?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::ServiceError;
    use catalog_infra::InMemorySubscriptionStore;
    use rust_decimal::Decimal;

    fn service() -> SubscriptionService {
        SubscriptionService::new(Arc::new(InMemorySubscriptionStore::new()))
    }

    fn fields(name: &str, days: i32, price: &str) -> PlanFields {
        PlanFields {
            plan_name: name.to_string(),
            duration_days: days,
            price: price.parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn create_get_delete_lifecycle() {
        let svc = service();
        let product_id = ProductId::new();
        let plan = svc
            .create_subscription_plan(product_id, fields("Basic", 30, "9.99"))
            .await
            .unwrap();

        let loaded = svc.get_subscription_plan_by_id(plan.id).await.unwrap();
        assert_eq!(loaded, plan);
        assert_eq!(loaded.plan_name, "Basic");
        assert_eq!(loaded.duration_days, 30);
        assert_eq!(loaded.price, Decimal::new(999, 2));

        svc.delete_subscription_plan(plan.id).await.unwrap();
        assert!(matches!(
            svc.get_subscription_plan_by_id(plan.id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn create_rejects_invalid_fields() {
        let svc = service();
        for bad in [fields("", 30, "9.99"), fields("Basic", 0, "9.99"), fields("Basic", 30, "0")] {
            let err = svc
                .create_subscription_plan(ProductId::new(), bad)
                .await
                .unwrap_err();
            assert!(err.is_invalid_argument(), "{err:?}");
        }
        assert!(svc.list_subscription_plans().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_overwrites_and_validates() {
        let svc = service();
        let plan = svc
            .create_subscription_plan(ProductId::new(), fields("Basic", 30, "9.99"))
            .await
            .unwrap();

        let updated = svc
            .update_subscription_plan(plan.id, fields("Pro", 365, "99.00"))
            .await
            .unwrap();
        assert_eq!(updated.id, plan.id);
        assert_eq!(updated.product_id, plan.product_id);
        assert_eq!(updated.plan_name, "Pro");

        let err = svc
            .update_subscription_plan(plan.id, fields("Pro", -5, "99.00"))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(svc.get_subscription_plan_by_id(plan.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_missing_plan_is_not_found() {
        let err = service()
            .update_subscription_plan(SubscriptionPlanId::new(), fields("Pro", 1, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn lists_all_and_by_product() {
        let svc = service();
        let a = ProductId::new();
        let b = ProductId::new();
        svc.create_subscription_plan(a, fields("A1", 30, "1")).await.unwrap();
        svc.create_subscription_plan(b, fields("B1", 30, "1")).await.unwrap();
        svc.create_subscription_plan(a, fields("A2", 30, "1")).await.unwrap();

        assert_eq!(svc.list_subscription_plans().await.unwrap().len(), 3);
        let for_a: Vec<_> = svc
            .list_plans_for_product(a)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.plan_name)
            .collect();
        assert_eq!(for_a, ["A1", "A2"]);
    }

    #[tokio::test]
    async fn delete_missing_plan_is_not_found() {
        let err = service()
            .delete_subscription_plan(SubscriptionPlanId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
