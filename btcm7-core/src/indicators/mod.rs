//! Relative-strength indicators of a crypto benchmark against an equity basket.
//!
//! - `stats`: return, momentum, rolling Z-score and rebasing kernels
//! - `signal`: summary stance from two momentum windows

/// Numeric kernels.
pub mod stats;
/// Summary signal.
pub mod signal;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use signal::Signal;

use crate::timeseries::align::AlignedTable;
use btcm7_types::{AssetClass, BasketWeights, Btcm7Error, IndicatorConfig};

/// Per-day indicator values for one aligned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    /// Trading days, ascending; every series below has one entry per day.
    pub days: Vec<NaiveDate>,
    /// Benchmark symbol.
    pub benchmark: String,
    /// Resolved basket weights by symbol.
    pub weights: BTreeMap<String, f64>,
    /// Benchmark closes.
    pub btc: Vec<f64>,
    /// Weighted basket value.
    pub basket: Vec<f64>,
    /// `100 * btc / basket`.
    pub ratio: Vec<f64>,
    /// Momentum spread in percentage points, keyed by window.
    pub momentum: BTreeMap<usize, Vec<Option<f64>>>,
    /// Rolling Z-score of the ratio.
    pub zscore: Vec<Option<f64>>,
    /// Z-score lookback used.
    pub zscore_lookback: usize,
    /// Benchmark rebased to 100 at the first day.
    pub btc_normalized: Vec<f64>,
    /// Basket rebased to 100 at the first day.
    pub basket_normalized: Vec<f64>,
    /// Summary of the last day.
    pub latest: LatestMetrics,
    /// Period change of each constituent, ordered by symbol.
    pub constituents: Vec<ConstituentChange>,
}

/// One day of [`Indicators`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    /// Trading day.
    pub day: NaiveDate,
    /// Benchmark close.
    pub btc: f64,
    /// Basket value.
    pub basket: f64,
    /// Ratio index.
    pub ratio: f64,
    /// Momentum by window.
    pub momentum: BTreeMap<usize, Option<f64>>,
    /// Ratio Z-score.
    pub zscore: Option<f64>,
}

/// Headline numbers for the most recent day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestMetrics {
    /// Last trading day.
    pub day: NaiveDate,
    /// Benchmark close.
    pub btc: f64,
    /// Basket value.
    pub basket: f64,
    /// Ratio index.
    pub ratio: f64,
    /// Momentum by configured window.
    pub momentum: BTreeMap<usize, Option<f64>>,
    /// Ratio Z-score.
    pub zscore: Option<f64>,
    /// Summary stance.
    pub signal: Signal,
    /// Benchmark change over the table, in percent.
    pub btc_change_pct: f64,
    /// Basket change over the table, in percent.
    pub basket_change_pct: f64,
}

/// Period change of one basket constituent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstituentChange {
    /// Equity symbol.
    pub symbol: String,
    /// Weight in the basket.
    pub weight: f64,
    /// `(last / first - 1) * 100`.
    pub change_pct: f64,
}

impl Indicators {
    /// Number of days.
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// True if there are no days.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Momentum series for `window`, if it was configured.
    #[must_use]
    pub fn momentum(&self, window: usize) -> Option<&[Option<f64>]> {
        self.momentum.get(&window).map(Vec::as_slice)
    }

    /// Row view for day index `i`.
    ///
    /// `None` when `i` is past the end of any column.
    #[must_use]
    pub fn row(&self, i: usize) -> Option<IndicatorRow> {
        Some(IndicatorRow {
            day: *self.days.get(i)?,
            btc: *self.btc.get(i)?,
            basket: *self.basket.get(i)?,
            ratio: *self.ratio.get(i)?,
            momentum: self
                .momentum
                .iter()
                .map(|(w, s)| Some((*w, *s.get(i)?)))
                .collect::<Option<_>>()?,
            zscore: *self.zscore.get(i)?,
        })
    }

    /// Iterate rows in day order.
    pub fn rows(&self) -> impl Iterator<Item = IndicatorRow> + '_ {
        (0..self.days.len()).filter_map(|i| self.row(i))
    }
}

/// Validated indicator configuration ready to run against aligned tables.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    cfg: IndicatorConfig,
}

impl IndicatorEngine {
    /// Validate `cfg` and build an engine.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for zero or missing windows, a zero lookback,
    /// or invalid tolerance or thresholds.
    pub fn new(cfg: IndicatorConfig) -> Result<Self, Btcm7Error> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &IndicatorConfig {
        &self.cfg
    }

    /// Rows needed so every window produces a value.
    #[must_use]
    pub fn min_history(&self) -> usize {
        self.cfg.min_history()
    }

    /// Compute every indicator series for `table`.
    ///
    /// # Errors
    /// - `InvalidConfig` if the table does not hold exactly one crypto ticker
    ///   and at least one equity, or the weights do not match the basket.
    /// - `InsufficientHistory` if the table has no rows.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(rows = table.len()))
    )]
    pub fn compute(&self, table: &AlignedTable) -> Result<Indicators, Btcm7Error> {
        let cfg = &self.cfg;
        let benchmark = single_benchmark(table)?;
        let weights = resolve_weights(table, &cfg.basket_weights, cfg.weight_tolerance)?;
        if table.is_empty() {
            return Err(Btcm7Error::InsufficientHistory {
                required: 1,
                available: 0,
            });
        }

        let btc = column(table, &benchmark)?.to_vec();
        let mut basket = vec![0.0; table.len()];
        for (symbol, w) in &weights {
            for (acc, p) in basket.iter_mut().zip(column(table, symbol)?) {
                *acc += w * p;
            }
        }
        let ratio: Vec<f64> = btc
            .iter()
            .zip(&basket)
            .map(|(b, k)| 100.0 * b / k)
            .collect();

        let momentum: BTreeMap<usize, Vec<Option<f64>>> = cfg
            .momentum_windows
            .iter()
            .map(|&w| (w, stats::momentum_series(&btc, &basket, w)))
            .collect();
        let zscore = stats::rolling_zscore(&ratio, cfg.zscore_lookback);

        let last = table.len() - 1;
        let signal = Signal::classify(
            stats::momentum_at(&btc, &basket, last, cfg.signal.short_window),
            stats::momentum_at(&btc, &basket, last, cfg.signal.medium_window),
            &cfg.signal,
        );
        let latest = LatestMetrics {
            day: table.days()[last],
            btc: btc[last],
            basket: basket[last],
            ratio: ratio[last],
            momentum: momentum.iter().map(|(w, s)| (*w, s[last])).collect(),
            zscore: zscore[last],
            signal,
            btc_change_pct: stats::period_change_pct(&btc).unwrap_or(0.0),
            basket_change_pct: stats::period_change_pct(&basket).unwrap_or(0.0),
        };

        let constituents = weights
            .iter()
            .map(|(symbol, &weight)| {
                Ok(ConstituentChange {
                    symbol: symbol.clone(),
                    weight,
                    change_pct: stats::period_change_pct(column(table, symbol)?).unwrap_or(0.0),
                })
            })
            .collect::<Result<Vec<_>, Btcm7Error>>()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            day = %latest.day,
            ratio = latest.ratio,
            signal = %latest.signal,
            "indicators computed"
        );

        Ok(Indicators {
            days: table.days().to_vec(),
            benchmark,
            weights,
            btc_normalized: stats::rebase_to_100(&btc),
            basket_normalized: stats::rebase_to_100(&basket),
            btc,
            basket,
            ratio,
            momentum,
            zscore,
            zscore_lookback: cfg.zscore_lookback,
            latest,
            constituents,
        })
    }
}

/// Validate `cfg` and compute indicators for `table` in one call.
///
/// # Errors
/// See [`IndicatorEngine::new`] and [`IndicatorEngine::compute`].
pub fn compute(table: &AlignedTable, cfg: &IndicatorConfig) -> Result<Indicators, Btcm7Error> {
    IndicatorEngine::new(cfg.clone())?.compute(table)
}

fn column<'a>(table: &'a AlignedTable, symbol: &str) -> Result<&'a [f64], Btcm7Error> {
    table
        .column(symbol)
        .ok_or_else(|| Btcm7Error::Data(format!("table has no column for {symbol}")))
}

fn single_benchmark(table: &AlignedTable) -> Result<String, Btcm7Error> {
    let mut crypto = table.tickers_of(AssetClass::Crypto);
    match (crypto.next(), crypto.next()) {
        (Some(t), None) => Ok(t.symbol().to_string()),
        (None, _) => Err(Btcm7Error::InvalidConfig(
            "table has no crypto benchmark".into(),
        )),
        (Some(_), Some(_)) => Err(Btcm7Error::InvalidConfig(
            "table has more than one crypto ticker".into(),
        )),
    }
}

fn resolve_weights(
    table: &AlignedTable,
    scheme: &BasketWeights,
    tolerance: f64,
) -> Result<BTreeMap<String, f64>, Btcm7Error> {
    let basket: Vec<&str> = table
        .tickers_of(AssetClass::Equity)
        .map(|t| t.symbol())
        .collect();
    if basket.is_empty() {
        return Err(Btcm7Error::InvalidConfig("table has no equity tickers".into()));
    }
    match scheme {
        BasketWeights::Equal => {
            let w = 1.0 / basket.len() as f64;
            Ok(basket.into_iter().map(|s| (s.to_string(), w)).collect())
        }
        BasketWeights::Custom(map) => {
            for (symbol, w) in map {
                if !(w.is_finite() && *w >= 0.0) {
                    return Err(Btcm7Error::InvalidConfig(format!(
                        "weight for {symbol} must be finite and non-negative, got {w}"
                    )));
                }
                if !basket.contains(&symbol.as_str()) {
                    return Err(Btcm7Error::InvalidConfig(format!(
                        "weight given for {symbol}, which is not in the basket"
                    )));
                }
            }
            if let Some(missing) = basket.iter().find(|s| !map.contains_key(**s)) {
                return Err(Btcm7Error::InvalidConfig(format!(
                    "basket ticker {missing} has no weight"
                )));
            }
            let sum: f64 = map.values().sum();
            if (sum - 1.0).abs() > tolerance {
                return Err(Btcm7Error::InvalidConfig(format!(
                    "basket weights sum to {sum}, expected 1.0"
                )));
            }
            Ok(map.clone())
        }
        _ => Err(Btcm7Error::InvalidConfig("unsupported basket weighting".into())),
    }
}
