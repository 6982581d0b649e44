//! Instrument identifiers and the default BTC-versus-M7 universe.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Btcm7Error;

/// Symbol used for Bitcoin when no override is configured.
pub const DEFAULT_BTC_SYMBOL: &str = "BTC/USD";

/// The seven basket constituents as `(symbol, display name)`.
pub const M7_CONSTITUENTS: [(&str, &str); 7] = [
    ("AAPL", "Apple"),
    ("MSFT", "Microsoft"),
    ("GOOGL", "Google"),
    ("AMZN", "Amazon"),
    ("NVDA", "NVIDIA"),
    ("META", "Meta"),
    ("TSLA", "Tesla"),
];

/// Approximate market capitalizations (trillion USD, December 2024) used for
/// the market-cap weighting preset.
pub const M7_MARKET_CAPS_TRILLIONS: [(&str, f64); 7] = [
    ("AAPL", 3.7),
    ("MSFT", 3.1),
    ("GOOGL", 2.3),
    ("AMZN", 2.3),
    ("NVDA", 3.4),
    ("META", 1.5),
    ("TSLA", 1.3),
];

/// Asset class of a ticker; decides its role in the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    /// Trades every calendar day; the benchmark side of the ratio.
    Crypto,
    /// Trades on exchange sessions; a basket constituent.
    Equity,
}

/// Immutable instrument identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTicker")]
pub struct Ticker {
    symbol: String,
    class: AssetClass,
}

#[derive(Deserialize)]
struct RawTicker {
    symbol: String,
    class: AssetClass,
}

impl TryFrom<RawTicker> for Ticker {
    type Error = Btcm7Error;

    fn try_from(raw: RawTicker) -> Result<Self, Self::Error> {
        Self::new(raw.symbol, raw.class)
    }
}

impl Ticker {
    /// Build a ticker, trimming surrounding whitespace.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the symbol is empty or contains whitespace.
    pub fn new(symbol: impl AsRef<str>, class: AssetClass) -> Result<Self, Btcm7Error> {
        let symbol = symbol.as_ref().trim();
        if symbol.is_empty() {
            return Err(Btcm7Error::InvalidArg("ticker symbol is empty".into()));
        }
        if symbol.chars().any(char::is_whitespace) {
            return Err(Btcm7Error::InvalidArg(format!(
                "ticker symbol '{symbol}' contains whitespace"
            )));
        }
        Ok(Self {
            symbol: symbol.to_string(),
            class,
        })
    }

    /// Shorthand for a crypto ticker.
    ///
    /// # Errors
    /// See [`Ticker::new`].
    pub fn crypto(symbol: impl AsRef<str>) -> Result<Self, Btcm7Error> {
        Self::new(symbol, AssetClass::Crypto)
    }

    /// Shorthand for an equity ticker.
    ///
    /// # Errors
    /// See [`Ticker::new`].
    pub fn equity(symbol: impl AsRef<str>) -> Result<Self, Btcm7Error> {
        Self::new(symbol, AssetClass::Equity)
    }

    /// Provider symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Asset class.
    #[must_use]
    pub const fn class(&self) -> AssetClass {
        self.class
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// The instruments requested on every refresh: one crypto benchmark and the
/// equity basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSet {
    benchmark: Ticker,
    basket: Vec<Ticker>,
}

impl TickerSet {
    /// Validate and build a ticker set.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the benchmark is not crypto, the basket is
    /// empty or contains a non-equity, or any symbol appears twice.
    pub fn new(benchmark: Ticker, basket: Vec<Ticker>) -> Result<Self, Btcm7Error> {
        if benchmark.class() != AssetClass::Crypto {
            return Err(Btcm7Error::InvalidConfig(format!(
                "benchmark '{benchmark}' must be a crypto ticker"
            )));
        }
        if basket.is_empty() {
            return Err(Btcm7Error::InvalidConfig("basket has no tickers".into()));
        }
        let mut seen = BTreeSet::new();
        seen.insert(benchmark.symbol().to_string());
        for t in &basket {
            if t.class() != AssetClass::Equity {
                return Err(Btcm7Error::InvalidConfig(format!(
                    "basket ticker '{t}' must be an equity"
                )));
            }
            if !seen.insert(t.symbol().to_string()) {
                return Err(Btcm7Error::InvalidConfig(format!(
                    "duplicate symbol '{t}' in ticker set"
                )));
            }
        }
        Ok(Self { benchmark, basket })
    }

    /// Bitcoin against the seven default constituents.
    ///
    /// # Errors
    /// Only fails if `btc_symbol` is not a valid symbol.
    pub fn m7(btc_symbol: &str) -> Result<Self, Btcm7Error> {
        let basket = M7_CONSTITUENTS
            .iter()
            .map(|(s, _)| Ticker::equity(s))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(Ticker::crypto(btc_symbol)?, basket)
    }

    /// The crypto benchmark.
    #[must_use]
    pub const fn benchmark(&self) -> &Ticker {
        &self.benchmark
    }

    /// The equity basket in configuration order.
    #[must_use]
    pub fn basket(&self) -> &[Ticker] {
        &self.basket
    }

    /// Benchmark followed by the basket.
    pub fn iter(&self) -> impl Iterator<Item = &Ticker> {
        std::iter::once(&self.benchmark).chain(self.basket.iter())
    }

    /// Number of tickers including the benchmark.
    #[must_use]
    pub fn len(&self) -> usize {
        self.basket.len() + 1
    }

    /// Always false; a valid set holds at least two tickers.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}
