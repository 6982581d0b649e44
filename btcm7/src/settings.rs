//! Flat named settings and their split into the typed configs.
//!
//! Environment variables:
//!
//! | variable                     | default                           |
//! |------------------------------|-----------------------------------|
//! | `TWELVE_DATA_API_KEY`        | unset                             |
//! | `BTCM7_BTC_SYMBOL`           | `BTC/USD`                         |
//! | `BTCM7_EQUITIES`             | `AAPL,MSFT,GOOGL,AMZN,NVDA,META,TSLA` |
//! | `BTCM7_WEIGHTING`            | `equal` (or `market_cap`)         |
//! | `BTCM7_MOMENTUM_WINDOWS`     | `7,30`                            |
//! | `BTCM7_ZSCORE_LOOKBACK`      | `90`                              |
//! | `BTCM7_CACHE_TTL_SECS`       | `300`                             |
//! | `BTCM7_REQUESTS_PER_MINUTE`  | `8`                               |
//! | `BTCM7_RETRY_ATTEMPTS`       | `4`                               |
//! | `BTCM7_PERIOD`               | `1y` (`1m`,`3m`,`6m`,`2y`,`5y`)   |
//! | `BTCM7_INTERVAL`             | `1day` (`1week`,`1month`)         |
//! | `BTCM7_MAX_GAP`              | `3`                               |

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use btcm7_core::{
    AlignConfig, BasketWeights, Btcm7Config, Btcm7Error, CacheConfig, DEFAULT_BTC_SYMBOL,
    GapPolicy, IndicatorConfig, Interval, M7_CONSTITUENTS, Period, QuotaConfig, RetryConfig,
    Ticker, TickerSet,
};
use secrecy::SecretString;
use serde::Deserialize;

/// Basket weighting preset selectable from flat settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// 1/N.
    #[default]
    Equal,
    /// Approximate market capitalization of the default constituents.
    MarketCap,
}

/// Flat named options for one deployment.
#[derive(Debug)]
pub struct Btcm7Settings {
    /// Twelve Data API key.
    pub api_key: Option<SecretString>,
    /// Benchmark symbol.
    pub btc_symbol: String,
    /// Basket symbols.
    pub equity_symbols: Vec<String>,
    /// Weighting preset, ignored when `custom_weights` is set.
    pub weighting: Weighting,
    /// Explicit symbol weights.
    pub custom_weights: Option<BTreeMap<String, f64>>,
    /// Momentum windows in rows.
    pub momentum_windows: Vec<usize>,
    /// Z-score lookback in rows.
    pub zscore_lookback: usize,
    /// Cache freshness window in seconds; 0 disables the cache.
    pub cache_ttl_secs: u64,
    /// Provider quota per minute.
    pub requests_per_minute: u64,
    /// Attempts per fetch, first call included.
    pub retry_attempts: u32,
    /// Refresh lookback.
    pub period: Period,
    /// Bar interval.
    pub interval: Interval,
    /// Forward-fill limit in consecutive days.
    pub max_gap: usize,
}

impl Default for Btcm7Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            btc_symbol: DEFAULT_BTC_SYMBOL.to_string(),
            equity_symbols: M7_CONSTITUENTS.iter().map(|(s, _)| (*s).to_string()).collect(),
            weighting: Weighting::Equal,
            custom_weights: None,
            momentum_windows: vec![7, 30],
            zscore_lookback: 90,
            cache_ttl_secs: 300,
            requests_per_minute: 8,
            retry_attempts: 4,
            period: Period::Y1,
            interval: Interval::Daily,
            max_gap: 3,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    api_key: Option<String>,
    btc_symbol: Option<String>,
    equity_symbols: Option<Vec<String>>,
    weighting: Option<Weighting>,
    custom_weights: Option<BTreeMap<String, f64>>,
    momentum_windows: Option<Vec<usize>>,
    zscore_lookback: Option<usize>,
    cache_ttl_secs: Option<u64>,
    requests_per_minute: Option<u64>,
    retry_attempts: Option<u32>,
    period: Option<String>,
    interval: Option<String>,
    max_gap: Option<usize>,
}

fn invalid(name: &str, value: &str) -> Btcm7Error {
    Btcm7Error::InvalidConfig(format!("{name}: cannot parse '{value}'"))
}

fn parse_period(raw: &str) -> Option<Period> {
    Some(match raw.trim().to_ascii_lowercase().as_str() {
        "1m" => Period::M1,
        "3m" => Period::M3,
        "6m" => Period::M6,
        "1y" => Period::Y1,
        "2y" => Period::Y2,
        "5y" => Period::Y5,
        _ => return None,
    })
}

fn parse_interval(raw: &str) -> Option<Interval> {
    Some(match raw.trim().to_ascii_lowercase().as_str() {
        "1day" => Interval::Daily,
        "1week" => Interval::Weekly,
        "1month" => Interval::Monthly,
        _ => return None,
    })
}

fn parse_weighting(raw: &str) -> Option<Weighting> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "equal" => Some(Weighting::Equal),
        "market_cap" => Some(Weighting::MarketCap),
        _ => None,
    }
}

fn parse_list<T: std::str::FromStr>(raw: &str) -> Option<Vec<T>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

fn non_empty_secret(raw: String) -> Option<SecretString> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| SecretString::from(trimmed.to_string()))
}

impl Btcm7Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, Btcm7Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    ///
    /// Unset and blank variables keep their defaults.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when a set variable cannot be parsed or the
    /// retry and quota settings are out of bounds.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Btcm7Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        fn num<T: std::str::FromStr>(name: &str, v: &str) -> Result<T, Btcm7Error> {
            v.trim().parse().map_err(|_| invalid(name, v))
        }

        let mut s = Self {
            api_key: get("TWELVE_DATA_API_KEY").and_then(non_empty_secret),
            ..Self::default()
        };
        if let Some(v) = get("BTCM7_BTC_SYMBOL") {
            s.btc_symbol = v.trim().to_string();
        }
        if let Some(v) = get("BTCM7_EQUITIES") {
            s.equity_symbols = parse_list(&v).ok_or_else(|| invalid("BTCM7_EQUITIES", &v))?;
        }
        if let Some(v) = get("BTCM7_WEIGHTING") {
            s.weighting = parse_weighting(&v).ok_or_else(|| invalid("BTCM7_WEIGHTING", &v))?;
        }
        if let Some(v) = get("BTCM7_MOMENTUM_WINDOWS") {
            s.momentum_windows =
                parse_list(&v).ok_or_else(|| invalid("BTCM7_MOMENTUM_WINDOWS", &v))?;
        }
        if let Some(v) = get("BTCM7_ZSCORE_LOOKBACK") {
            s.zscore_lookback = num("BTCM7_ZSCORE_LOOKBACK", &v)?;
        }
        if let Some(v) = get("BTCM7_CACHE_TTL_SECS") {
            s.cache_ttl_secs = num("BTCM7_CACHE_TTL_SECS", &v)?;
        }
        if let Some(v) = get("BTCM7_REQUESTS_PER_MINUTE") {
            s.requests_per_minute = num("BTCM7_REQUESTS_PER_MINUTE", &v)?;
        }
        if let Some(v) = get("BTCM7_RETRY_ATTEMPTS") {
            s.retry_attempts = num("BTCM7_RETRY_ATTEMPTS", &v)?;
        }
        if let Some(v) = get("BTCM7_PERIOD") {
            s.period = parse_period(&v).ok_or_else(|| invalid("BTCM7_PERIOD", &v))?;
        }
        if let Some(v) = get("BTCM7_INTERVAL") {
            s.interval = parse_interval(&v).ok_or_else(|| invalid("BTCM7_INTERVAL", &v))?;
        }
        if let Some(v) = get("BTCM7_MAX_GAP") {
            s.max_gap = num("BTCM7_MAX_GAP", &v)?;
        }
        s.validated()
    }

    /// Parse a JSON document using the same field names as the struct.
    ///
    /// Missing fields keep their defaults; `period` and `interval` use the
    /// short forms accepted by the environment (`1y`, `1day`).
    ///
    /// # Errors
    /// Returns `InvalidConfig` for malformed JSON, unknown fields, unparsable
    /// values, or out-of-bounds retry and quota settings.
    pub fn from_json(doc: &str) -> Result<Self, Btcm7Error> {
        let raw: RawSettings = serde_json::from_str(doc)
            .map_err(|e| Btcm7Error::InvalidConfig(format!("settings json: {e}")))?;
        let d = Self::default();
        let period = match raw.period {
            Some(p) => parse_period(&p).ok_or_else(|| invalid("period", &p))?,
            None => d.period,
        };
        let interval = match raw.interval {
            Some(i) => parse_interval(&i).ok_or_else(|| invalid("interval", &i))?,
            None => d.interval,
        };
        Self {
            api_key: raw.api_key.and_then(non_empty_secret),
            btc_symbol: raw.btc_symbol.unwrap_or(d.btc_symbol),
            equity_symbols: raw.equity_symbols.unwrap_or(d.equity_symbols),
            weighting: raw.weighting.unwrap_or(d.weighting),
            custom_weights: raw.custom_weights,
            momentum_windows: raw.momentum_windows.unwrap_or(d.momentum_windows),
            zscore_lookback: raw.zscore_lookback.unwrap_or(d.zscore_lookback),
            cache_ttl_secs: raw.cache_ttl_secs.unwrap_or(d.cache_ttl_secs),
            requests_per_minute: raw.requests_per_minute.unwrap_or(d.requests_per_minute),
            retry_attempts: raw.retry_attempts.unwrap_or(d.retry_attempts),
            period,
            interval,
            max_gap: raw.max_gap.unwrap_or(d.max_gap),
        }
        .validated()
    }

    fn validated(self) -> Result<Self, Btcm7Error> {
        self.retry_config().validate()?;
        self.quota_config().validate()?;
        Ok(self)
    }

    /// The API key, required by the HTTP connector.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when no key is configured.
    pub fn require_api_key(&self) -> Result<&SecretString, Btcm7Error> {
        self.api_key
            .as_ref()
            .ok_or_else(|| Btcm7Error::InvalidConfig("TWELVE_DATA_API_KEY is not set".into()))
    }

    /// Move the API key out, for handing to the HTTP connector.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when no key is configured.
    pub fn take_api_key(&mut self) -> Result<SecretString, Btcm7Error> {
        self.api_key
            .take()
            .ok_or_else(|| Btcm7Error::InvalidConfig("TWELVE_DATA_API_KEY is not set".into()))
    }

    /// Benchmark plus basket.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a blank symbol and `InvalidConfig` for an
    /// invalid set (see [`TickerSet::new`]).
    pub fn ticker_set(&self) -> Result<TickerSet, Btcm7Error> {
        let basket = self
            .equity_symbols
            .iter()
            .map(Ticker::equity)
            .collect::<Result<Vec<_>, _>>()?;
        TickerSet::new(Ticker::crypto(&self.btc_symbol)?, basket)
    }

    /// Basket weights from the preset or the explicit mapping.
    #[must_use]
    pub fn basket_weights(&self) -> BasketWeights {
        match (&self.custom_weights, self.weighting) {
            (Some(w), _) => BasketWeights::Custom(w.clone()),
            (None, Weighting::MarketCap) => BasketWeights::market_cap_default(),
            (None, Weighting::Equal) => BasketWeights::Equal,
        }
    }

    /// Orchestrator configuration.
    #[must_use]
    pub fn btcm7_config(&self) -> Btcm7Config {
        Btcm7Config {
            interval: self.interval,
            period: self.period,
            align: AlignConfig {
                policy: GapPolicy::ForwardFill {
                    max_gap: self.max_gap,
                },
                ..AlignConfig::default()
            },
            indicators: IndicatorConfig {
                basket_weights: self.basket_weights(),
                momentum_windows: self.momentum_windows.clone(),
                zscore_lookback: self.zscore_lookback,
                ..IndicatorConfig::default()
            },
            ..Btcm7Config::default()
        }
    }

    /// Freshness cache settings.
    #[must_use]
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl_ms: self.cache_ttl_secs.saturating_mul(1_000),
            ..CacheConfig::default()
        }
    }

    /// Client-side quota mirroring the provider's per-minute limit.
    #[must_use]
    pub fn quota_config(&self) -> QuotaConfig {
        QuotaConfig {
            limit: self.requests_per_minute,
            window: Duration::from_secs(60),
            ..QuotaConfig::default()
        }
    }

    /// Retry policy.
    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry_attempts,
            ..RetryConfig::default()
        }
    }
}
