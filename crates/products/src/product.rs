use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use catalog_core::{DetailId, Entity, ProductId};

/// Product kind discriminator.
///
/// A product is specialised into at most one kind; a product without details has no kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Digital,
    Physical,
    Subscription,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Digital => "digital",
            ProductKind::Physical => "physical",
            ProductKind::Subscription => "subscription",
        }
    }

    /// Parse a list filter discriminator.
    ///
    /// Unrecognised or empty input yields `None`, which callers treat as "all products".
    pub fn parse_filter(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "digital" => Some(ProductKind::Digital),
            "physical" => Some(ProductKind::Physical),
            "subscription" => Some(ProductKind::Subscription),
            _ => None,
        }
    }
}

impl core::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downloadable product details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalProduct {
    pub id: DetailId,
    pub file_size: i32,
    pub download_link: String,
}

/// Shippable product details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalProduct {
    pub id: DetailId,
    pub weight: f64,
    pub dimensions: String,
}

/// Recurring product details.
///
/// Not to be confused with a subscription plan: this describes the product itself,
/// a plan is a separate pricing offer referencing any product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionProductDetails {
    pub id: DetailId,
    pub subscription_period: String,
    pub renewal_price: f64,
}

/// Type-specific product details (at most one per product).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProductDetails {
    #[default]
    None,
    Digital(DigitalProduct),
    Physical(PhysicalProduct),
    Subscription(SubscriptionProductDetails),
}

impl ProductDetails {
    pub fn kind(&self) -> Option<ProductKind> {
        match self {
            ProductDetails::None => None,
            ProductDetails::Digital(_) => Some(ProductKind::Digital),
            ProductDetails::Physical(_) => Some(ProductKind::Physical),
            ProductDetails::Subscription(_) => Some(ProductKind::Subscription),
        }
    }

    pub fn detail_id(&self) -> Option<DetailId> {
        match self {
            ProductDetails::None => None,
            ProductDetails::Digital(d) => Some(d.id),
            ProductDetails::Physical(p) => Some(p.id),
            ProductDetails::Subscription(s) => Some(s.id),
        }
    }

    /// Assign a fresh id to the detail record if it has none yet.
    pub fn assign_missing_id(&mut self) {
        let id = match self {
            ProductDetails::None => return,
            ProductDetails::Digital(d) => &mut d.id,
            ProductDetails::Physical(p) => &mut p.id,
            ProductDetails::Subscription(s) => &mut s.id,
        };
        if id.is_nil() {
            *id = DetailId::new();
        }
    }
}

/// The mutable subset of a product: everything else is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: String,
    pub description: String,
    pub price: Decimal,
}

/// Aggregate root: Product.
///
/// `price` is non-negative by convention; it is not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub details: ProductDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a new product with freshly generated ids for the product and its details.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Decimal,
        details: ProductDetails,
        now: DateTime<Utc>,
    ) -> Self {
        let mut product = Self {
            id: ProductId::new(),
            name: name.into(),
            description: description.into(),
            price,
            details,
            created_at: now,
            updated_at: now,
        };
        product.assign_missing_ids();
        product
    }

    pub fn kind(&self) -> Option<ProductKind> {
        self.details.kind()
    }

    pub fn is_kind(&self, kind: ProductKind) -> bool {
        self.kind() == Some(kind)
    }

    /// Ensure both the product and its detail record carry non-nil ids.
    pub fn assign_missing_ids(&mut self) {
        if self.id.is_nil() {
            self.id = ProductId::new();
        }
        self.details.assign_missing_id();
    }

    /// Overwrite name, description and price. Id and details are left untouched.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) {
        self.name = patch.name;
        self.description = patch.description;
        self.price = patch.price;
        self.updated_at = now;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn digital() -> ProductDetails {
        ProductDetails::Digital(DigitalProduct {
            id: DetailId::nil(),
            file_size: 100,
            download_link: "http://x/a".to_string(),
        })
    }

    #[test]
    fn new_product_assigns_product_and_detail_ids() {
        let p = Product::new("Widget", "A widget", price("19.99"), digital(), Utc::now());
        assert!(!p.id.is_nil());
        let detail_id = p.details.detail_id().unwrap();
        assert!(!detail_id.is_nil());
        assert_eq!(p.kind(), Some(ProductKind::Digital));
        assert_eq!(p.created_at, p.updated_at);
    }

    #[test]
    fn assign_missing_ids_keeps_existing_ids() {
        let detail_id = DetailId::new();
        let mut p = Product::new(
            "Crate",
            "",
            price("5"),
            ProductDetails::Physical(PhysicalProduct {
                id: detail_id,
                weight: 1.5,
                dimensions: "10x10x10".to_string(),
            }),
            Utc::now(),
        );
        let id = p.id;
        p.assign_missing_ids();
        assert_eq!(p.id, id);
        assert_eq!(p.details.detail_id(), Some(detail_id));
    }

    #[test]
    fn product_without_details_has_no_kind() {
        let p = Product::new("Plain", "", price("1"), ProductDetails::None, Utc::now());
        assert_eq!(p.kind(), None);
        assert_eq!(p.details.detail_id(), None);
        assert!(!p.is_kind(ProductKind::Digital));
    }

    #[test]
    fn kind_filter_parsing() {
        assert_eq!(ProductKind::parse_filter("digital"), Some(ProductKind::Digital));
        assert_eq!(ProductKind::parse_filter(" Physical "), Some(ProductKind::Physical));
        assert_eq!(ProductKind::parse_filter("SUBSCRIPTION"), Some(ProductKind::Subscription));
        assert_eq!(ProductKind::parse_filter(""), None);
        assert_eq!(ProductKind::parse_filter("bundle"), None);
    }

    #[test]
    fn assign_missing_id_fills_nil_detail_id() {
        let mut details = digital();
        assert_eq!(details.detail_id(), Some(DetailId::nil()));
        details.assign_missing_id();
        assert!(!details.detail_id().unwrap().is_nil());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: a patch only touches name, description and price.
            #[test]
            fn patch_leaves_identity_and_details_untouched(
                name in "[A-Za-z][A-Za-z0-9 ]{0,40}",
                description in "[A-Za-z0-9 ]{0,80}",
                cents in 0i64..10_000_000i64,
            ) {
                let created = Utc::now();
                let mut p = Product::new("Widget", "orig", Decimal::new(1999, 2), digital(), created);
                let before = p.clone();

                p.apply_patch(
                    ProductPatch { name: name.clone(), description: description.clone(), price: Decimal::new(cents, 2) },
                    created + chrono::Duration::seconds(1),
                );

                prop_assert_eq!(p.id, before.id);
                prop_assert_eq!(&p.details, &before.details);
                prop_assert_eq!(p.created_at, before.created_at);
                prop_assert_eq!(p.name, name);
                prop_assert_eq!(p.description, description);
                prop_assert_eq!(p.price, Decimal::new(cents, 2));
                prop_assert!(p.updated_at > before.updated_at);
            }
        }
    }
}
