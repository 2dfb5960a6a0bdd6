//! Tracing and logging setup shared by the catalog binaries.

/// Tracing configuration (filters, writers, flush guard).
pub mod tracing;

pub use crate::tracing::{init, LogConfig, LogGuard};
