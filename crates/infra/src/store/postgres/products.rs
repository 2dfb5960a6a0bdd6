use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::{instrument, Span};
use uuid::Uuid;

use catalog_core::{DetailId, ProductId};
use catalog_products::{
    DigitalProduct, PhysicalProduct, Product, ProductDetails, ProductKind, SubscriptionProductDetails,
};

use super::map_sqlx_error;
use crate::store::{ProductStore, StoreError};

const SELECT_PRODUCT: &str = r#"
    SELECT
        p.id,
        p.kind,
        p.name,
        p.description,
        p.price,
        p.created_at,
        p.updated_at,
        d.id AS detail_id,
        d.file_size,
        d.download_link,
        d.weight,
        d.dimensions,
        d.subscription_period,
        d.renewal_price
    FROM products p
    LEFT JOIN product_details d ON d.product_id = p.id
"#;

/// Postgres-backed product store.
///
/// A product row and its detail row are written in one transaction; reads join them back.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_details(
        tx: &mut Transaction<'_, Postgres>,
        product_id: ProductId,
        details: &ProductDetails,
        operation: &str,
    ) -> Result<(), StoreError> {
        let Some(kind) = details.kind() else {
            return Ok(());
        };
        let cols = DetailColumns::from(details);

        sqlx::query(
            r#"
            INSERT INTO product_details (
                product_id, id, kind,
                file_size, download_link,
                weight, dimensions,
                subscription_period, renewal_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (product_id) DO NOTHING
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(cols.id)
        .bind(kind.as_str())
        .bind(cols.file_size)
        .bind(cols.download_link)
        .bind(cols.weight)
        .bind(cols.dimensions)
        .bind(cols.subscription_period)
        .bind(cols.renewal_price)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;

        Ok(())
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self, product), fields(product_id = %product.id, kind = ?product.kind()), err)]
    async fn create(&self, product: &Product) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_product", e))?;

        sqlx::query(
            r#"
            INSERT INTO products (id, kind, name, description, price, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.kind().map(|k| k.as_str()))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;

        Self::insert_details(&mut tx, product.id, &product.details, "create_product").await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_product", e))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_by_id(&self, id: ProductId) -> Result<Product, StoreError> {
        let row = sqlx::query(&format!("{SELECT_PRODUCT} WHERE p.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;

        match row {
            Some(row) => decode_product(&row),
            None => Err(StoreError::product_not_found(id)),
        }
    }

    /// Upserts the product row. Detail rows are only written when the product row is new.
    #[instrument(skip(self, product), fields(product_id = %product.id, inserted = tracing::field::Empty), err)]
    async fn update(&self, product: &Product) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;

        // xmax is zero only for a freshly inserted tuple.
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO products (id, kind, name, description, price, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                updated_at = EXCLUDED.updated_at
            RETURNING (xmax = 0)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.kind().map(|k| k.as_str()))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.created_at)
        .bind(product.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        Span::current().record("inserted", inserted);

        if inserted {
            Self::insert_details(&mut tx, product.id, &product.details, "update_product").await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_product", e))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        // product_details rows go with it (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(kind = ?kind, product_count = tracing::field::Empty), err)]
    async fn list(&self, kind: Option<ProductKind>) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            "{SELECT_PRODUCT} WHERE ($1::text IS NULL OR p.kind = $1) ORDER BY p.created_at, p.id"
        ))
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        let products = rows.iter().map(decode_product).collect::<Result<Vec<_>, _>>()?;
        Span::current().record("product_count", products.len());
        Ok(products)
    }

    /// Matches the canonical hyphenated text of the id, case-insensitively. Anything else
    /// (braced, URN or simple forms included) matches nothing.
    #[instrument(skip(self), err)]
    async fn find_by_raw_id(&self, raw_id: &str) -> Result<Option<Product>, StoreError> {
        let Some(id) = canonical_uuid(raw_id) else {
            return Ok(None);
        };
        let row = sqlx::query(&format!("{SELECT_PRODUCT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product_by_raw_id", e))?;

        row.as_ref().map(decode_product).transpose()
    }
}

/// Flattened detail columns for the single `product_details` table.
#[derive(Debug, Default)]
struct DetailColumns<'a> {
    id: Option<Uuid>,
    file_size: Option<i32>,
    download_link: Option<&'a str>,
    weight: Option<f64>,
    dimensions: Option<&'a str>,
    subscription_period: Option<&'a str>,
    renewal_price: Option<f64>,
}

impl<'a> From<&'a ProductDetails> for DetailColumns<'a> {
    fn from(details: &'a ProductDetails) -> Self {
        match details {
            ProductDetails::None => Self::default(),
            ProductDetails::Digital(d) => Self {
                id: Some(*d.id.as_uuid()),
                file_size: Some(d.file_size),
                download_link: Some(&d.download_link),
                ..Self::default()
            },
            ProductDetails::Physical(p) => Self {
                id: Some(*p.id.as_uuid()),
                weight: Some(p.weight),
                dimensions: Some(&p.dimensions),
                ..Self::default()
            },
            ProductDetails::Subscription(s) => Self {
                id: Some(*s.id.as_uuid()),
                subscription_period: Some(&s.subscription_period),
                renewal_price: Some(s.renewal_price),
                ..Self::default()
            },
        }
    }
}

/// Raw joined row; converted into a [`Product`] with [`TryFrom`].
#[derive(Debug)]
struct ProductRow {
    id: Uuid,
    kind: Option<String>,
    name: String,
    description: String,
    price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    detail_id: Option<Uuid>,
    file_size: Option<i32>,
    download_link: Option<String>,
    weight: Option<f64>,
    dimensions: Option<String>,
    subscription_period: Option<String>,
    renewal_price: Option<f64>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            kind: row.try_get("kind")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            detail_id: row.try_get("detail_id")?,
            file_size: row.try_get("file_size")?,
            download_link: row.try_get("download_link")?,
            weight: row.try_get("weight")?,
            dimensions: row.try_get("dimensions")?,
            subscription_period: row.try_get("subscription_period")?,
            renewal_price: row.try_get("renewal_price")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| {
            StoreError::Database(format!("product {} has {}", row.id, what))
        };

        let details = match row.kind.as_deref() {
            None => ProductDetails::None,
            Some(raw) => {
                let kind = ProductKind::parse_filter(raw)
                    .ok_or_else(|| corrupt(&format!("unknown kind {raw:?}")))?;
                let detail_id = DetailId::from_uuid(row.detail_id.ok_or_else(|| corrupt("no detail row"))?);
                match kind {
                    ProductKind::Digital => ProductDetails::Digital(DigitalProduct {
                        id: detail_id,
                        file_size: row.file_size.ok_or_else(|| corrupt("no file_size"))?,
                        download_link: row
                            .download_link
                            .clone()
                            .ok_or_else(|| corrupt("no download_link"))?,
                    }),
                    ProductKind::Physical => ProductDetails::Physical(PhysicalProduct {
                        id: detail_id,
                        weight: row.weight.ok_or_else(|| corrupt("no weight"))?,
                        dimensions: row.dimensions.clone().ok_or_else(|| corrupt("no dimensions"))?,
                    }),
                    ProductKind::Subscription => {
                        ProductDetails::Subscription(SubscriptionProductDetails {
                            id: detail_id,
                            subscription_period: row
                                .subscription_period
                                .clone()
                                .ok_or_else(|| corrupt("no subscription_period"))?,
                            renewal_price: row
                                .renewal_price
                                .ok_or_else(|| corrupt("no renewal_price"))?,
                        })
                    }
                }
            }
        };

        Ok(Product {
            id: ProductId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn canonical_uuid(raw: &str) -> Option<Uuid> {
    let needle = raw.trim().to_ascii_lowercase();
    let id = Uuid::parse_str(&needle).ok()?;
    (id.hyphenated().to_string() == needle).then_some(id)
}

fn decode_product(row: &PgRow) -> Result<Product, StoreError> {
    let row = ProductRow::from_row(row)
        .map_err(|e| StoreError::Database(format!("failed to decode product row: {}", e)))?;
    Product::try_from(row)
}

#[cfg(test)]
mod raw_id_tests {
    use super::canonical_uuid;

    #[test]
    fn only_hyphenated_text_is_canonical() {
        let id = uuid::Uuid::now_v7();
        let text = id.hyphenated().to_string();
        assert_eq!(canonical_uuid(&text), Some(id));
        assert_eq!(canonical_uuid(&format!("  {}  ", text.to_uppercase())), Some(id));
        assert_eq!(canonical_uuid(&id.simple().to_string()), None);
        assert_eq!(canonical_uuid(&format!("{{{text}}}")), None);
        assert_eq!(canonical_uuid("garbage"), None);
        assert_eq!(canonical_uuid(""), None);
    }
}
