//! Middleware trait for wrapping `Btcm7Connector` implementations.

use std::sync::Arc;

use crate::connector::Btcm7Connector;

/// Trait implemented by connector middleware layers.
///
/// A middleware consumes an inner `Btcm7Connector` and returns a wrapped connector
/// that augments or restricts behavior (e.g., caching, quotas, retries).
pub trait Middleware: Send + Sync {
    /// Apply this middleware to wrap an inner connector and return the wrapped connector.
    fn apply(self: Box<Self>, inner: Arc<dyn Btcm7Connector>) -> Arc<dyn Btcm7Connector>;

    /// Human-readable middleware name for introspection/logging.
    fn name(&self) -> &'static str;

    /// Opaque configuration snapshot for serialization/inspection.
    fn config_json(&self) -> serde_json::Value;
}
