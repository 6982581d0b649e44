//! btcm7-twelvedata
//!
//! Connector that implements `Btcm7Connector` on top of the Twelve Data
//! `GET /time_series` endpoint. Provider payloads are validated at the boundary
//! into `RawSeries`; failures are normalized onto `Btcm7Error`.
#![warn(missing_docs)]

mod builder;
mod response;

use std::time::Duration;

use async_trait::async_trait;
use btcm7_core::connector::{Btcm7Connector, SeriesProvider};
use btcm7_core::{AssetClass, Btcm7Error, ConnectorKey, RawSeries, SeriesRequest, Ticker};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

pub use builder::TwelveDataConnectorBuilder;

pub(crate) const CONNECTOR_NAME: &str = "btcm7-twelvedata";

/// Public endpoint used when no base URL override is given.
pub const DEFAULT_BASE_URL: &str = "https://api.twelvedata.com/";

/// Largest page the provider returns for one request.
const OUTPUT_SIZE: &str = "5000";

/// Twelve Data connector.
pub struct TwelveDataConnector {
    http: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
}

impl TwelveDataConnector {
    /// Static connector key for logs and error attribution.
    pub const KEY: ConnectorKey = ConnectorKey::new(CONNECTOR_NAME);

    /// Build against the public API with a 10 second HTTP timeout.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the API key is empty or the HTTP client
    /// cannot be built.
    pub fn new_default(api_key: SecretString) -> Result<Self, Btcm7Error> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, Duration::from_secs(10))
    }

    /// Build against `base_url` (tests point this at a local stub server).
    ///
    /// # Errors
    /// Returns `InvalidConfig` for an empty key, an unparsable base URL, or an
    /// HTTP client build failure.
    pub fn with_base_url(
        api_key: SecretString,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, Btcm7Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Btcm7Error::InvalidConfig(format!("http client: {e}")))?;
        Self::try_new_with_reqwest_client(http, api_key, base_url)
    }

    /// Build from a caller-provided `reqwest::Client`.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for an empty key or an unparsable base URL.
    pub fn try_new_with_reqwest_client(
        http: reqwest::Client,
        api_key: SecretString,
        base_url: &str,
    ) -> Result<Self, Btcm7Error> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(Btcm7Error::InvalidConfig("twelve data api key is empty".into()));
        }
        let mut base = Url::parse(base_url)
            .map_err(|e| Btcm7Error::InvalidConfig(format!("base url '{base_url}': {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("time_series")
            .map_err(|e| Btcm7Error::InvalidConfig(format!("base url '{base_url}': {e}")))?;
        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    fn request_url(&self, ticker: &Ticker, req: &SeriesRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("symbol", ticker.symbol())
            .append_pair("interval", req.interval().as_str())
            .append_pair("start_date", &req.start().format("%Y-%m-%d").to_string())
            .append_pair("end_date", &req.end().format("%Y-%m-%d").to_string())
            .append_pair("order", "ASC")
            .append_pair("outputsize", OUTPUT_SIZE)
            .append_pair("apikey", self.api_key.expose_secret());
        url
    }

    fn transport_error(e: reqwest::Error) -> Btcm7Error {
        let kind = if e.is_timeout() {
            "timeout"
        } else if e.is_connect() {
            "connect"
        } else {
            "transport"
        };
        // Display of a reqwest error may include the URL; strip it so the key never leaks.
        let e = e.without_url();
        Btcm7Error::unavailable(CONNECTOR_NAME, format!("{kind} error: {e}"))
    }
}

fn retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| secs.saturating_mul(1_000))
}

#[async_trait]
impl Btcm7Connector for TwelveDataConnector {
    fn name(&self) -> &'static str {
        CONNECTOR_NAME
    }

    fn vendor(&self) -> &'static str {
        "Twelve Data"
    }

    fn supports_class(&self, class: AssetClass) -> bool {
        matches!(class, AssetClass::Crypto | AssetClass::Equity)
    }

    fn as_series_provider(&self) -> Option<&dyn SeriesProvider> {
        Some(self as &dyn SeriesProvider)
    }
}

#[async_trait]
impl SeriesProvider for TwelveDataConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "btcm7::twelvedata::series",
            skip_all,
            fields(symbol = %ticker, start = %req.start(), end = %req.end()),
        )
    )]
    async fn series(&self, ticker: &Ticker, req: &SeriesRequest) -> Result<RawSeries, Btcm7Error> {
        let resp = self
            .http
            .get(self.request_url(ticker, req))
            .send()
            .await
            .map_err(Self::transport_error)?;
        let status = resp.status().as_u16();
        let hint = retry_after_ms(resp.headers());
        let body = resp.text().await.map_err(Self::transport_error)?;
        let out = response::decode(ticker, status, &body, hint);
        #[cfg(feature = "tracing")]
        match &out {
            Ok(s) => tracing::debug!(status, points = s.len(), "twelve data response"),
            Err(e) => tracing::warn!(status, error = %e, "twelve data request failed"),
        }
        out
    }
}
