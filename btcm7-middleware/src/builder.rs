//! Builder for composing connectors with middleware layers.
//!
//! Layers form an onion around the raw connector. `layers` is stored
//! outermost-first and applied in reverse during [`ConnectorBuilder::build`].
//!
//! [`ConnectorBuilder::standard`] produces the stack used by the orchestrator:
//!
//! ```text
//! Cache(Retry(Quota(Raw)))
//! ```
//!
//! A cache hit returns before retry or quota run; every retry attempt passes
//! through the quota so a refused attempt is backed off like a provider 429.

use std::sync::Arc;

use btcm7_core::Middleware;
use btcm7_core::connector::Btcm7Connector;
use btcm7_types::{CacheConfig, QuotaConfig, RetryConfig};
use serde_json::json;

use crate::cache::CacheMiddleware;
use crate::quota::QuotaMiddleware;
use crate::retry::RetryMiddleware;

const QUOTA: &str = "QuotaAwareConnector";
const RETRY: &str = "RetryingConnector";
const CACHE: &str = "CachingConnector";

/// Generic middleware builder for composing a connector with layered wrappers.
pub struct ConnectorBuilder {
    raw: Arc<dyn Btcm7Connector>,
    /// Middleware layers in outermost-first order.
    layers: Vec<Box<dyn Middleware>>,
}

impl ConnectorBuilder {
    /// Create a new builder from a raw, unwrapped connector.
    #[must_use]
    pub fn new(raw: Arc<dyn Btcm7Connector>) -> Self {
        Self {
            raw,
            layers: Vec::new(),
        }
    }

    /// Cache, retry and quota in their canonical order.
    #[must_use]
    pub fn standard(
        raw: Arc<dyn Btcm7Connector>,
        cache: &CacheConfig,
        retry: &RetryConfig,
        quota: &QuotaConfig,
    ) -> Self {
        Self::new(raw)
            .with_quota(quota)
            .with_retry(retry)
            .with_cache(cache)
    }

    /// Add or replace the quota layer at the outermost position.
    #[must_use]
    pub fn with_quota(self, cfg: &QuotaConfig) -> Self {
        self.without(QUOTA)
            .layer(Box::new(QuotaMiddleware::new(cfg.clone())))
    }

    /// Add or replace the retry layer at the outermost position.
    #[must_use]
    pub fn with_retry(self, cfg: &RetryConfig) -> Self {
        self.without(RETRY)
            .layer(Box::new(RetryMiddleware::new(*cfg)))
    }

    /// Add or replace the cache layer at the outermost position.
    #[must_use]
    pub fn with_cache(self, cfg: &CacheConfig) -> Self {
        self.without(CACHE)
            .layer(Box::new(CacheMiddleware::new(cfg.clone())))
    }

    /// Remove the quota layer if present.
    #[must_use]
    pub fn without_quota(self) -> Self {
        self.without(QUOTA)
    }

    /// Remove the retry layer if present.
    #[must_use]
    pub fn without_retry(self) -> Self {
        self.without(RETRY)
    }

    /// Remove the cache layer if present.
    #[must_use]
    pub fn without_cache(self) -> Self {
        self.without(CACHE)
    }

    fn without(mut self, name: &str) -> Self {
        self.layers.retain(|m| m.name() != name);
        self
    }

    /// Add an arbitrary middleware layer at the outermost position.
    #[must_use]
    pub fn layer(mut self, layer: Box<dyn Middleware>) -> Self {
        self.layers.insert(0, layer);
        self
    }

    /// Layer names and configs, outermost first, ending with the raw connector.
    #[must_use]
    pub fn describe(&self) -> Vec<serde_json::Value> {
        self.layers
            .iter()
            .map(|l| json!({ "name": l.name(), "config": l.config_json() }))
            .chain(std::iter::once(
                json!({ "name": "RawConnector", "config": { "name": self.raw.name() } }),
            ))
            .collect()
    }

    /// Build the wrapped connector, applying layers innermost first.
    #[must_use]
    pub fn build(self) -> Arc<dyn Btcm7Connector> {
        let mut acc: Arc<dyn Btcm7Connector> = Arc::clone(&self.raw);
        for m in self.layers.into_iter().rev() {
            acc = m.apply(acc);
        }
        acc
    }
}
