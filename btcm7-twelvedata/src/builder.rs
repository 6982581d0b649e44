use std::sync::Arc;

use btcm7_core::Btcm7Error;
use btcm7_core::connector::Btcm7Connector;
use btcm7_middleware::ConnectorBuilder as GenericConnectorBuilder;
use btcm7_types::{CacheConfig, QuotaConfig, RetryConfig};
use secrecy::SecretString;

use crate::TwelveDataConnector;

/// Builder type alias specialized for Twelve Data connectors.
pub type TwelveDataConnectorBuilder = GenericConnectorBuilder;

impl TwelveDataConnector {
    /// Returns an unconfigured builder around the default connector.
    ///
    /// Customize with the builder methods before calling `.build()`.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the key is empty.
    pub fn new(api_key: SecretString) -> Result<TwelveDataConnectorBuilder, Btcm7Error> {
        let raw: Arc<dyn Btcm7Connector> = Arc::new(Self::new_default(api_key)?);
        Ok(GenericConnectorBuilder::new(raw))
    }

    /// Returns a builder with the free-tier quota (8 requests per minute),
    /// retry with backoff, and a five minute cache.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the key is empty.
    pub fn rate_limited(api_key: SecretString) -> Result<TwelveDataConnectorBuilder, Btcm7Error> {
        let raw: Arc<dyn Btcm7Connector> = Arc::new(Self::new_default(api_key)?);
        Ok(GenericConnectorBuilder::standard(
            raw,
            &CacheConfig::default(),
            &RetryConfig::default(),
            &QuotaConfig::default(),
        ))
    }

    /// Expert-only: construct an unwrapped connector for manual composition.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the key is empty.
    pub fn new_raw(api_key: SecretString) -> Result<Self, Btcm7Error> {
        Self::new_default(api_key)
    }
}
