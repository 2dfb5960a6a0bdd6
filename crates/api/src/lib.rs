//! HTTP API for the product catalog and subscription plans.

pub mod app;
