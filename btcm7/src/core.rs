use std::sync::Arc;
use std::time::Duration;

use btcm7_core::connector::Btcm7Connector;
use btcm7_core::{
    AlignConfig, AssetClass, BasketWeights, Btcm7Config, Btcm7Error, GapPolicy, IndicatorConfig,
    IndicatorEngine, Interval, Period, TickerSet, DEFAULT_BTC_SYMBOL,
};
use chrono::NaiveDate;

use crate::client::MarketDataClient;

/// Orchestrator that fetches the ticker set, aligns it and computes indicators.
pub struct Btcm7 {
    pub(crate) client: MarketDataClient,
    pub(crate) tickers: TickerSet,
    pub(crate) engine: IndicatorEngine,
    pub(crate) cfg: Btcm7Config,
}

/// Builder for constructing a `Btcm7` orchestrator with custom configuration.
pub struct Btcm7Builder {
    connector: Option<Arc<dyn Btcm7Connector>>,
    tickers: Option<TickerSet>,
    cfg: Btcm7Config,
}

impl Default for Btcm7Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Btcm7Builder {
    /// Create a new builder with default configuration.
    ///
    /// Starts without a connector; register one via [`Btcm7Builder::with_connector`].
    /// The ticker set defaults to `BTC/USD` against the seven M7 equities.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connector: None,
            tickers: None,
            cfg: Btcm7Config::default(),
        }
    }

    /// Register the series connector, usually a middleware-wrapped stack.
    ///
    /// A second call replaces the first connector.
    #[must_use]
    pub fn with_connector(mut self, c: Arc<dyn Btcm7Connector>) -> Self {
        self.connector = Some(c);
        self
    }

    /// Replace the instruments requested on every refresh.
    #[must_use]
    pub fn tickers(mut self, tickers: TickerSet) -> Self {
        self.tickers = Some(tickers);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: Btcm7Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Bar interval requested from the provider.
    #[must_use]
    pub const fn interval(mut self, interval: Interval) -> Self {
        self.cfg.interval = interval;
        self
    }

    /// Lookback used by [`Btcm7::refresh`].
    #[must_use]
    pub const fn period(mut self, period: Period) -> Self {
        self.cfg.period = period;
        self
    }

    /// Maximum number of per-ticker fetches in flight.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.cfg.max_concurrency = n;
        self
    }

    /// Upper bound for one ticker's fetch, retries included.
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.provider_timeout = timeout;
        self
    }

    /// Deadline for the whole fetch fan-out of one refresh.
    ///
    /// When exceeded, the refresh fails with `RequestTimeout`.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout = Some(timeout);
        self
    }

    /// Alignment settings.
    #[must_use]
    pub fn align(mut self, align: AlignConfig) -> Self {
        self.cfg.align = align;
        self
    }

    /// Gap handling policy used by the aligner.
    #[must_use]
    pub const fn gap_policy(mut self, policy: GapPolicy) -> Self {
        self.cfg.align.policy = policy;
        self
    }

    /// Indicator settings.
    #[must_use]
    pub fn indicators(mut self, cfg: IndicatorConfig) -> Self {
        self.cfg.indicators = cfg;
        self
    }

    /// Basket weighting scheme.
    #[must_use]
    pub fn basket_weights(mut self, weights: BasketWeights) -> Self {
        self.cfg.indicators.basket_weights = weights;
        self
    }

    /// Momentum windows in rows.
    #[must_use]
    pub fn momentum_windows(mut self, windows: Vec<usize>) -> Self {
        self.cfg.indicators.momentum_windows = windows;
        self
    }

    /// Rolling window for the ratio Z-score.
    #[must_use]
    pub const fn zscore_lookback(mut self, lookback: usize) -> Self {
        self.cfg.indicators.zscore_lookback = lookback;
        self
    }

    /// Number of previous snapshots a [`crate::Monitor`] keeps.
    #[must_use]
    pub const fn history_capacity(mut self, n: usize) -> Self {
        self.cfg.history_capacity = n;
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no connector was registered, and `InvalidConfig`
    /// if the connector cannot serve the ticker set, concurrency is zero, the
    /// indicator settings are invalid, or custom weights do not name exactly
    /// the basket symbols.
    pub fn build(self) -> Result<Btcm7, Btcm7Error> {
        let connector = self.connector.ok_or_else(|| {
            Btcm7Error::InvalidArg(
                "no connector registered; add one via with_connector(...)".to_string(),
            )
        })?;
        if connector.as_series_provider().is_none() {
            return Err(Btcm7Error::InvalidConfig(format!(
                "connector {} does not provide series",
                connector.name()
            )));
        }
        for class in [AssetClass::Crypto, AssetClass::Equity] {
            if !connector.supports_class(class) {
                return Err(Btcm7Error::InvalidConfig(format!(
                    "connector {} does not serve {class:?} tickers",
                    connector.name()
                )));
            }
        }
        if self.cfg.max_concurrency == 0 {
            return Err(Btcm7Error::InvalidConfig("max_concurrency must be >= 1".into()));
        }
        let tickers = match self.tickers {
            Some(t) => t,
            None => TickerSet::m7(DEFAULT_BTC_SYMBOL)?,
        };
        if let BasketWeights::Custom(w) = &self.cfg.indicators.basket_weights {
            let unknown = w
                .keys()
                .find(|s| !tickers.basket().iter().any(|t| t.symbol() == s.as_str()));
            if let Some(s) = unknown {
                return Err(Btcm7Error::InvalidConfig(format!(
                    "weight for '{s}' which is not in the basket"
                )));
            }
            if let Some(t) = tickers.basket().iter().find(|t| !w.contains_key(t.symbol())) {
                return Err(Btcm7Error::InvalidConfig(format!("no weight for basket ticker '{t}'")));
            }
        }
        let engine = IndicatorEngine::new(self.cfg.indicators.clone())?;

        Ok(Btcm7 {
            client: MarketDataClient::new(connector, self.cfg.interval),
            tickers,
            engine,
            cfg: self.cfg,
        })
    }
}

impl Btcm7 {
    /// Start building a new `Btcm7` instance.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use btcm7::Btcm7;
    /// use btcm7_mock::MockConnector;
    ///
    /// let app = Btcm7::builder()
    ///     .with_connector(Arc::new(MockConnector::new()))
    ///     .zscore_lookback(60)
    ///     .build()?;
    /// let snapshot = app.refresh().await?;
    /// println!("{}", snapshot.latest().signal);
    /// ```
    #[must_use]
    pub fn builder() -> Btcm7Builder {
        Btcm7Builder::new()
    }

    /// The client used for per-ticker fetches.
    #[must_use]
    pub const fn client(&self) -> &MarketDataClient {
        &self.client
    }

    /// Instruments requested on every refresh.
    #[must_use]
    pub const fn tickers(&self) -> &TickerSet {
        &self.tickers
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &Btcm7Config {
        &self.cfg
    }

    /// Rows the aligned table must hold for a refresh to succeed.
    #[must_use]
    pub fn required_rows(&self) -> usize {
        self.cfg.align.min_rows.max(self.engine.min_history())
    }

    /// First day fetched by a refresh ending at `end`.
    ///
    /// Covers the configured period, widened to [`Btcm7::required_rows`] bars
    /// of the configured interval when the period alone is too short.
    #[must_use]
    pub fn fetch_start(&self, end: NaiveDate) -> NaiveDate {
        self.cfg
            .period
            .fetch_start(self.cfg.interval, end, self.required_rows())
    }
}

/// Run `fut` under an optional deadline, mapping expiry to `RequestTimeout`.
pub(crate) async fn with_request_deadline<F, T>(
    deadline: Option<Duration>,
    capability: &str,
    fut: F,
) -> Result<T, Btcm7Error>
where
    F: std::future::Future<Output = T>,
{
    match deadline {
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .map_err(|_| Btcm7Error::request_timeout(capability)),
        None => Ok(fut.await),
    }
}
