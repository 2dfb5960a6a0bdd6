//! In-memory stores for tests/dev.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use catalog_core::{Entity, ProductId, SubscriptionPlanId};
use catalog_products::{Product, ProductKind};
use catalog_subscriptions::SubscriptionPlan;

use super::{ProductStore, StoreError, SubscriptionStore};

/// Insertion-ordered rows keyed by entity id.
#[derive(Debug)]
struct EntityTable<T> {
    rows: RwLock<Vec<T>>,
}

impl<T> Default for EntityTable<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl<T> EntityTable<T>
where
    T: Entity + Clone,
{
    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<T>>, StoreError> {
        self.rows
            .read()
            .map_err(|_| StoreError::Database("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<T>>, StoreError> {
        self.rows
            .write()
            .map_err(|_| StoreError::Database("in-memory store lock poisoned".to_string()))
    }

    fn insert(&self, row: T) -> Result<(), StoreError> {
        self.insert_checked(row, |_, _| None)
    }

    /// Append `row` unless its id is taken or `clash(existing, &row)` reports a conflict.
    fn insert_checked(
        &self,
        row: T,
        clash: impl Fn(&T, &T) -> Option<String>,
    ) -> Result<(), StoreError> {
        let mut rows = self.write()?;
        for existing in rows.iter() {
            if existing.id() == row.id() {
                return Err(StoreError::Conflict(format!("duplicate id {}", row.id())));
            }
            if let Some(message) = clash(existing, &row) {
                return Err(StoreError::Conflict(message));
            }
        }
        rows.push(row);
        Ok(())
    }

    fn get(&self, id: &T::Id) -> Result<Option<T>, StoreError> {
        Ok(self.read()?.iter().find(|r| r.id() == id).cloned())
    }

    /// Apply `merge` to the existing row, or append `row` when none matches.
    fn upsert(&self, row: T, merge: impl FnOnce(&mut T, T)) -> Result<(), StoreError> {
        let mut rows = self.write()?;
        match rows.iter_mut().find(|r| r.id() == row.id()) {
            Some(existing) => merge(existing, row),
            None => rows.push(row),
        }
        Ok(())
    }

    fn remove(&self, id: &T::Id) -> Result<bool, StoreError> {
        let mut rows = self.write()?;
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        Ok(rows.len() != before)
    }

    fn filter(&self, pred: impl Fn(&T) -> bool) -> Result<Vec<T>, StoreError> {
        Ok(self.read()?.iter().filter(|r| pred(r)).cloned().collect())
    }
}

/// In-memory product store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    products: EntityTable<Product>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    /// Detail ids are unique across products, as in `product_details`.
    async fn create(&self, product: &Product) -> Result<(), StoreError> {
        self.products.insert_checked(product.clone(), |existing, incoming| {
            let detail_id = incoming.details.detail_id()?;
            (existing.details.detail_id() == Some(detail_id))
                .then(|| format!("duplicate detail id {detail_id}"))
        })
    }

    async fn get_by_id(&self, id: ProductId) -> Result<Product, StoreError> {
        self.products
            .get(&id)?
            .ok_or_else(|| StoreError::product_not_found(id))
    }

    async fn update(&self, product: &Product) -> Result<(), StoreError> {
        self.products.upsert(product.clone(), |existing, incoming| {
            existing.name = incoming.name;
            existing.description = incoming.description;
            existing.price = incoming.price;
            existing.updated_at = incoming.updated_at;
        })
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        self.products.remove(&id)
    }

    async fn list(&self, kind: Option<ProductKind>) -> Result<Vec<Product>, StoreError> {
        self.products
            .filter(|p| kind.is_none_or(|k| p.is_kind(k)))
    }

    async fn find_by_raw_id(&self, raw_id: &str) -> Result<Option<Product>, StoreError> {
        let needle = raw_id.trim().to_ascii_lowercase();
        Ok(self
            .products
            .filter(|p| p.id.to_string() == needle)?
            .into_iter()
            .next())
    }
}

/// In-memory subscription plan store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    plans: EntityTable<SubscriptionPlan>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn save(&self, plan: &SubscriptionPlan) -> Result<(), StoreError> {
        self.plans.insert(plan.clone())
    }

    async fn find_by_id(&self, id: SubscriptionPlanId) -> Result<SubscriptionPlan, StoreError> {
        self.plans
            .get(&id)?
            .ok_or_else(|| StoreError::plan_not_found(id))
    }

    async fn find_by_product_id(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<SubscriptionPlan>, StoreError> {
        self.plans.filter(|p| p.product_id == product_id)
    }

    async fn delete(&self, id: SubscriptionPlanId) -> Result<(), StoreError> {
        if self.plans.remove(&id)? {
            Ok(())
        } else {
            Err(StoreError::plan_not_found(id))
        }
    }

    async fn update(&self, plan: &SubscriptionPlan) -> Result<(), StoreError> {
        self.plans
            .upsert(plan.clone(), |existing, incoming| *existing = incoming)
    }

    async fn list_all(&self) -> Result<Vec<SubscriptionPlan>, StoreError> {
        self.plans.filter(|_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::DetailId;
    use catalog_products::{DigitalProduct, PhysicalProduct, ProductDetails, ProductPatch};
    use catalog_subscriptions::PlanFields;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn digital(name: &str) -> Product {
        Product::new(
            name,
            "",
            Decimal::new(1999, 2),
            ProductDetails::Digital(DigitalProduct {
                id: DetailId::nil(),
                file_size: 100,
                download_link: "http://x/a".to_string(),
            }),
            Utc::now(),
        )
    }

    fn physical(name: &str) -> Product {
        Product::new(
            name,
            "",
            Decimal::new(500, 2),
            ProductDetails::Physical(PhysicalProduct {
                id: DetailId::nil(),
                weight: 2.5,
                dimensions: "1x2x3".to_string(),
            }),
            Utc::now(),
        )
    }

    fn plan(product_id: ProductId, name: &str) -> SubscriptionPlan {
        SubscriptionPlan::new(
            product_id,
            PlanFields {
                plan_name: name.to_string(),
                duration_days: 30,
                price: Decimal::new(999, 2),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn product_create_get_round_trip() {
        let store = InMemoryProductStore::new();
        let p = digital("Widget");
        store.create(&p).await.unwrap();

        let loaded = store.get_by_id(p.id).await.unwrap();
        assert_eq!(loaded, p);
    }

    #[tokio::test]
    async fn product_create_rejects_duplicate_id() {
        let store = InMemoryProductStore::new();
        let p = digital("Widget");
        store.create(&p).await.unwrap();
        let err = store.create(&p).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn product_create_rejects_shared_detail_id() {
        let store = InMemoryProductStore::new();
        let first = digital("Widget");
        store.create(&first).await.unwrap();

        let mut second = physical("Crate");
        if let ProductDetails::Physical(details) = &mut second.details {
            details.id = first.details.detail_id().unwrap();
        }
        let err = store.create(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.get_by_id(second.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn product_get_missing_is_not_found() {
        let store = InMemoryProductStore::new();
        let err = store.get_by_id(ProductId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn product_update_keeps_details() {
        let store = InMemoryProductStore::new();
        let p = digital("Widget");
        store.create(&p).await.unwrap();

        let mut changed = p.clone();
        changed.apply_patch(
            ProductPatch {
                name: "Gadget".to_string(),
                description: "new".to_string(),
                price: Decimal::new(2500, 2),
            },
            Utc::now(),
        );
        changed.details = ProductDetails::None;
        store.update(&changed).await.unwrap();

        let loaded = store.get_by_id(p.id).await.unwrap();
        assert_eq!(loaded.name, "Gadget");
        assert_eq!(loaded.price, Decimal::new(2500, 2));
        assert_eq!(loaded.details, p.details);
    }

    #[tokio::test]
    async fn product_delete_is_idempotent() {
        let store = InMemoryProductStore::new();
        let p = digital("Widget");
        store.create(&p).await.unwrap();

        assert!(store.delete(p.id).await.unwrap());
        assert!(!store.delete(p.id).await.unwrap());
        assert!(store.get_by_id(p.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn product_list_filters_by_kind_in_insertion_order() {
        let store = InMemoryProductStore::new();
        let a = digital("a");
        let b = physical("b");
        let c = digital("c");
        for p in [&a, &b, &c] {
            store.create(p).await.unwrap();
        }

        let all: Vec<_> = store.get_all().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(all, ["a", "b", "c"]);

        let digital_only: Vec<_> = store
            .get_by_kind(ProductKind::Digital)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(digital_only, ["a", "c"]);

        assert!(store.get_by_kind(ProductKind::Subscription).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn product_find_by_raw_id_matches_text() {
        let store = InMemoryProductStore::new();
        let p = digital("Widget");
        store.create(&p).await.unwrap();

        let upper = p.id.to_string().to_uppercase();
        assert_eq!(store.find_by_raw_id(&upper).await.unwrap().map(|f| f.id), Some(p.id));
        assert!(store.find_by_raw_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn plan_lifecycle() {
        let store = InMemorySubscriptionStore::new();
        let product_id = ProductId::new();
        let basic = plan(product_id, "Basic");
        let other = plan(ProductId::new(), "Other");
        store.save(&basic).await.unwrap();
        store.save(&other).await.unwrap();

        assert_eq!(store.find_by_id(basic.id).await.unwrap(), basic);
        assert_eq!(store.find_by_product_id(product_id).await.unwrap(), vec![basic.clone()]);
        assert_eq!(store.list_all().await.unwrap().len(), 2);

        let mut renamed = basic.clone();
        renamed.plan_name = "Pro".to_string();
        store.update(&renamed).await.unwrap();
        assert_eq!(store.find_by_id(basic.id).await.unwrap().plan_name, "Pro");

        store.delete(basic.id).await.unwrap();
        assert!(store.find_by_id(basic.id).await.unwrap_err().is_not_found());
        assert!(store.delete(basic.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn plan_save_rejects_duplicate_id() {
        let store = InMemorySubscriptionStore::new();
        let basic = plan(ProductId::new(), "Basic");
        store.save(&basic).await.unwrap();
        assert!(matches!(store.save(&basic).await.unwrap_err(), StoreError::Conflict(_)));
    }
}
