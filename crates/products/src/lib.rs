//! Products domain module.
//!
//! This crate contains the product catalog model: the `Product` aggregate and its
//! optional type-specific details, implemented as plain data plus pure
//! transformations (no IO, no HTTP, no storage).

pub mod product;

pub use product::{
    DigitalProduct, PhysicalProduct, Product, ProductDetails, ProductKind, ProductPatch,
    SubscriptionProductDetails,
};
