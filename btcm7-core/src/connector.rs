use async_trait::async_trait;

use crate::series::{RawSeries, SeriesRequest};
use btcm7_types::{AssetClass, Btcm7Error, ConnectorKey, Ticker};

/// Focused role trait for connectors that provide close-price history.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Fetch the close series for `ticker` over the inclusive date range in `req`.
    ///
    /// Implementations map provider failures onto the `Btcm7Error` taxonomy:
    /// unknown symbols to `UnknownTicker`, quota responses to
    /// `ProviderRateLimited`, transport/5xx/malformed payloads to
    /// `ProviderUnavailable`.
    async fn series(&self, ticker: &Ticker, req: &SeriesRequest) -> Result<RawSeries, Btcm7Error>;
}

/// Main connector trait implemented by provider crates and middleware. Exposes
/// capability discovery.
#[async_trait]
pub trait Btcm7Connector: Send + Sync {
    /// A stable identifier used in logs and error attribution (e.g. "btcm7-twelvedata").
    fn name(&self) -> &'static str;

    /// Canonical connector key constructed from the static name.
    fn key(&self) -> ConnectorKey {
        ConnectorKey::new(self.name())
    }

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Whether this connector claims to serve a given asset class.
    ///
    /// Default: returns `false`. Connectors must explicitly declare support.
    fn supports_class(&self, class: AssetClass) -> bool {
        let _ = class;
        false
    }

    /// Advertise the series capability by returning a usable trait object reference.
    fn as_series_provider(&self) -> Option<&dyn SeriesProvider> {
        None
    }
}

/// Generate `Btcm7Connector` metadata and the `as_series_provider` accessor for a
/// wrapper that delegates to an inner connector field.
#[macro_export]
macro_rules! btcm7_connector_delegate {
    ($inner:ident) => {
        fn name(&self) -> &'static str {
            self.$inner.name()
        }

        fn vendor(&self) -> &'static str {
            self.$inner.vendor()
        }

        fn supports_class(&self, class: $crate::AssetClass) -> bool {
            self.$inner.supports_class(class)
        }

        fn as_series_provider(&self) -> Option<&dyn $crate::connector::SeriesProvider> {
            if self.$inner.as_series_provider().is_some() {
                Some(self as &dyn $crate::connector::SeriesProvider)
            } else {
                None
            }
        }
    };
}
