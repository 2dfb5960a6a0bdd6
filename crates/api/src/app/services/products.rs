use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use catalog_core::ProductId;
use catalog_infra::ProductStore;
use catalog_products::{Product, ProductKind, ProductPatch};

use super::{ServiceError, ServiceResult};

/// Product operations. No field validation is applied to product payloads.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    /// Persist a new product together with its details, filling in missing ids.
    #[instrument(skip(self, product), fields(product_id = %product.id, kind = ?product.kind()), err)]
    pub async fn create_product(&self, mut product: Product) -> ServiceResult<Product> {
        product.assign_missing_ids();
        self.store.create(&product).await?;
        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    #[instrument(skip(self), err)]
    pub async fn get_product_by_id(&self, id: ProductId) -> ServiceResult<Product> {
        Ok(self.store.get_by_id(id).await?)
    }

    /// Overwrite name, description and price of an existing product.
    #[instrument(skip(self, patch), err)]
    pub async fn update_product(&self, id: ProductId, patch: ProductPatch) -> ServiceResult<Product> {
        let mut product = self.store.get_by_id(id).await?;
        product.apply_patch(patch, Utc::now());
        self.store.update(&product).await?;
        Ok(product)
    }

    /// Deleting an absent product succeeds.
    #[instrument(skip(self), err)]
    pub async fn delete_product(&self, id: ProductId) -> ServiceResult<()> {
        let removed = self.store.delete(id).await?;
        info!(removed, "product delete");
        Ok(())
    }

    /// `kind` is the wire discriminator; anything unrecognised lists every product.
    #[instrument(skip(self), err)]
    pub async fn list_products(&self, kind: &str) -> ServiceResult<Vec<Product>> {
        let products = match ProductKind::parse_filter(kind) {
            Some(kind) => self.store.get_by_kind(kind).await?,
            None => self.store.get_all().await?,
        };
        Ok(products)
    }

    /// Look up a product by the text of its id, without parsing it.
    #[instrument(skip(self), err)]
    pub async fn find_product_by_id(&self, raw_id: &str) -> ServiceResult<Product> {
        if raw_id.trim().is_empty() {
            return Err(ServiceError::InvalidArgument("product ID cannot be empty".to_string()));
        }
        self.store
            .find_by_raw_id(raw_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product with ID {} not found", raw_id.trim())))
    }
}
