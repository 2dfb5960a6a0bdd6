use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use catalog_core::{ProductId, SubscriptionPlanId};
use catalog_subscriptions::SubscriptionPlan;

use super::map_sqlx_error;
use crate::store::{StoreError, SubscriptionStore};

#[derive(Debug, Clone)]
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PlanRow {
    id: Uuid,
    product_id: Uuid,
    plan_name: String,
    duration_days: i32,
    price: Decimal,
}

impl From<PlanRow> for SubscriptionPlan {
    fn from(row: PlanRow) -> Self {
        Self {
            id: SubscriptionPlanId::from_uuid(row.id),
            product_id: ProductId::from_uuid(row.product_id),
            plan_name: row.plan_name,
            duration_days: row.duration_days,
            price: row.price,
        }
    }
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    #[instrument(skip(self, plan), fields(plan_id = %plan.id, product_id = %plan.product_id), err)]
    async fn save(&self, plan: &SubscriptionPlan) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO subscription_plans (id, product_id, plan_name, duration_days, price)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(plan.product_id.as_uuid())
        .bind(&plan.plan_name)
        .bind(plan.duration_days)
        .bind(plan.price)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_plan", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(plan_id = %id), err)]
    async fn find_by_id(&self, id: SubscriptionPlanId) -> Result<SubscriptionPlan, StoreError> {
        sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, product_id, plan_name, duration_days, price
            FROM subscription_plans
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_plan", e))?
        .map(SubscriptionPlan::from)
        .ok_or_else(|| StoreError::plan_not_found(id))
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn find_by_product_id(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<SubscriptionPlan>, StoreError> {
        let rows = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, product_id, plan_name, duration_days, price
            FROM subscription_plans
            WHERE product_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_plans_by_product", e))?;

        Ok(rows.into_iter().map(SubscriptionPlan::from).collect())
    }

    #[instrument(skip(self), fields(plan_id = %id), err)]
    async fn delete(&self, id: SubscriptionPlanId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM subscription_plans WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_plan", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::plan_not_found(id));
        }
        Ok(())
    }

    #[instrument(skip(self, plan), fields(plan_id = %plan.id), err)]
    async fn update(&self, plan: &SubscriptionPlan) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO subscription_plans (id, product_id, plan_name, duration_days, price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                product_id = EXCLUDED.product_id,
                plan_name = EXCLUDED.plan_name,
                duration_days = EXCLUDED.duration_days,
                price = EXCLUDED.price
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(plan.product_id.as_uuid())
        .bind(&plan.plan_name)
        .bind(plan.duration_days)
        .bind(plan.price)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_plan", e))?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_all(&self) -> Result<Vec<SubscriptionPlan>, StoreError> {
        let rows = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, product_id, plan_name, duration_days, price
            FROM subscription_plans
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_plans", e))?;

        Ok(rows.into_iter().map(SubscriptionPlan::from).collect())
    }
}

#[cfg(all(test, feature = "pg-tests"))]
mod tests {
    use super::*;
    use crate::store::postgres::test_support::migrated_database;
    use catalog_subscriptions::PlanFields;

    fn plan(product_id: ProductId, price: &str) -> SubscriptionPlan {
        SubscriptionPlan::new(
            product_id,
            PlanFields {
                plan_name: "Basic".to_string(),
                duration_days: 30,
                price: price.parse().unwrap(),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_find_update_delete() {
        let store = migrated_database().await.subscription_store();
        let product_id = ProductId::new();
        let mut p = plan(product_id, "9.99");
        store.save(&p).await.unwrap();

        assert_eq!(store.find_by_id(p.id).await.unwrap(), p);
        assert_eq!(store.find_by_product_id(product_id).await.unwrap(), vec![p.clone()]);

        p.price = "12.50".parse().unwrap();
        store.update(&p).await.unwrap();
        assert_eq!(store.find_by_id(p.id).await.unwrap().price, p.price);

        store.delete(p.id).await.unwrap();
        assert!(store.find_by_id(p.id).await.unwrap_err().is_not_found());
        assert!(store.delete(p.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn duplicate_save_is_conflict() {
        let store = migrated_database().await.subscription_store();
        let p = plan(ProductId::new(), "9.99");
        store.save(&p).await.unwrap();
        assert!(matches!(store.save(&p).await.unwrap_err(), StoreError::Conflict(_)));
    }
}
