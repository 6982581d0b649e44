use std::collections::{BTreeMap, BTreeSet, btree_map::Entry};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::series::{PricePoint, RawSeries};
use crate::timeseries::util::{ensure_strictly_increasing, ensure_valid_close};
use btcm7_types::{AlignConfig, AssetClass, Btcm7Error, GapPolicy, Ticker};

/// Close prices of several tickers on a shared, ascending trading-day index.
///
/// Every ticker has a value on every day; tickers are ordered by symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedTable {
    days: Vec<NaiveDate>,
    tickers: Vec<Ticker>,
    columns: BTreeMap<String, Vec<f64>>,
    filled_cells: usize,
}

impl AlignedTable {
    /// Build a table from pre-aligned columns.
    ///
    /// # Errors
    /// Returns `Btcm7Error::Data` if days are not strictly increasing, a
    /// ticker repeats or lacks a column, a column length differs from the day
    /// count, or any price is non-finite or not strictly positive.
    pub fn from_columns(
        days: Vec<NaiveDate>,
        tickers: Vec<Ticker>,
        mut columns: BTreeMap<String, Vec<f64>>,
    ) -> Result<Self, Btcm7Error> {
        ensure_strictly_increasing(&days)?;
        let mut by_symbol: BTreeMap<String, Ticker> = BTreeMap::new();
        for t in tickers {
            if by_symbol.insert(t.symbol().to_string(), t.clone()).is_some() {
                return Err(Btcm7Error::Data(format!("duplicate ticker {t} in table")));
            }
        }
        let mut kept = BTreeMap::new();
        for (symbol, ticker) in &by_symbol {
            let col = columns
                .remove(symbol)
                .ok_or_else(|| Btcm7Error::Data(format!("no column for {symbol}")))?;
            if col.len() != days.len() {
                return Err(Btcm7Error::Data(format!(
                    "column {symbol} has {} values for {} days",
                    col.len(),
                    days.len()
                )));
            }
            for (day, close) in days.iter().zip(&col) {
                ensure_valid_close(ticker, &PricePoint::new(*day, *close))?;
            }
            kept.insert(symbol.clone(), col);
        }
        if let Some(extra) = columns.keys().next() {
            return Err(Btcm7Error::Data(format!("column {extra} has no ticker")));
        }
        Ok(Self {
            days,
            tickers: by_symbol.into_values().collect(),
            columns: kept,
            filled_cells: 0,
        })
    }

    /// Trading days in ascending order.
    #[must_use]
    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    /// Tickers ordered by symbol.
    #[must_use]
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// Tickers of the given asset class, ordered by symbol.
    pub fn tickers_of(&self, class: AssetClass) -> impl Iterator<Item = &Ticker> {
        self.tickers.iter().filter(move |t| t.class() == class)
    }

    /// Close column for `symbol`, one value per day.
    #[must_use]
    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.columns.get(symbol).map(Vec::as_slice)
    }

    /// Number of rows (days).
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// True if no rows survived alignment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Number of cells carried forward from an earlier day.
    #[must_use]
    pub const fn filled_cells(&self) -> usize {
        self.filled_cells
    }

    /// Keep only the most recent `n` rows.
    #[must_use]
    pub fn tail(mut self, n: usize) -> Self {
        let skip = self.days.len().saturating_sub(n);
        if skip > 0 {
            self.days.drain(..skip);
            for col in self.columns.values_mut() {
                col.drain(..skip);
            }
        }
        self
    }
}

/// Align per-ticker series onto a common trading-day index.
///
/// Input order does not matter: series are keyed by symbol before joining.
/// With [`GapPolicy::Intersection`] only days observed by every ticker are kept.
/// With [`GapPolicy::ForwardFill`] the union of observed days is used and a
/// ticker missing on a day takes its last close, provided its current run of
/// missing days does not exceed `max_gap`; days that cannot be filled, and days
/// before a ticker's first observation, are dropped. `lookback` then keeps the
/// most recent rows.
///
/// # Errors
/// - `Btcm7Error::Data` when the input is empty or a symbol appears twice.
/// - `Btcm7Error::InsufficientHistory` when fewer than `min_rows` rows remain.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
pub fn align<I>(series: I, cfg: &AlignConfig) -> Result<AlignedTable, Btcm7Error>
where
    I: IntoIterator<Item = RawSeries>,
{
    let mut keyed: BTreeMap<String, RawSeries> = BTreeMap::new();
    for s in series {
        match keyed.entry(s.ticker().symbol().to_string()) {
            Entry::Vacant(v) => {
                v.insert(s);
            }
            Entry::Occupied(o) => {
                return Err(Btcm7Error::Data(format!(
                    "duplicate series for ticker {}",
                    o.key()
                )));
            }
        }
    }
    if keyed.is_empty() {
        return Err(Btcm7Error::Data("no series to align".into()));
    }

    let lookups: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = keyed
        .iter()
        .map(|(sym, s)| {
            let by_day = s.points().iter().map(|p| (p.day, p.close)).collect();
            (sym.as_str(), by_day)
        })
        .collect();

    let union: BTreeSet<NaiveDate> = lookups.values().flat_map(|m| m.keys().copied()).collect();

    let mut days = Vec::new();
    let mut columns: BTreeMap<String, Vec<f64>> =
        keyed.keys().map(|k| (k.clone(), Vec::new())).collect();
    let mut filled_cells = 0usize;
    let mut dropped = 0usize;

    match cfg.policy {
        GapPolicy::Intersection => {
            for day in union {
                let row: Option<Vec<f64>> =
                    lookups.values().map(|m| m.get(&day).copied()).collect();
                let Some(row) = row else {
                    dropped += 1;
                    continue;
                };
                days.push(day);
                for (col, v) in columns.values_mut().zip(row) {
                    col.push(v);
                }
            }
        }
        GapPolicy::ForwardFill { max_gap } => {
            // Per ticker: last observed close and length of the current missing run.
            let mut carry: Vec<(Option<f64>, usize)> = vec![(None, 0); lookups.len()];
            for day in union {
                let mut row = Vec::with_capacity(lookups.len());
                let mut row_fills = 0usize;
                let mut complete = true;
                for (m, (last, gap)) in lookups.values().zip(carry.iter_mut()) {
                    if let Some(v) = m.get(&day) {
                        *last = Some(*v);
                        *gap = 0;
                        row.push(*v);
                        continue;
                    }
                    *gap += 1;
                    match *last {
                        Some(v) if *gap <= max_gap => {
                            row.push(v);
                            row_fills += 1;
                        }
                        _ => complete = false,
                    }
                }
                if !complete {
                    dropped += 1;
                    continue;
                }
                filled_cells += row_fills;
                days.push(day);
                for (col, v) in columns.values_mut().zip(row) {
                    col.push(v);
                }
            }
        }
        _ => return Err(Btcm7Error::InvalidConfig("unsupported gap policy".into())),
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        rows = days.len(),
        dropped,
        filled_cells,
        "aligned {} series",
        keyed.len()
    );
    #[cfg(not(feature = "tracing"))]
    let _ = dropped;

    let tickers = keyed.into_values().map(|s| s.ticker().clone()).collect();
    let mut table = AlignedTable {
        days,
        tickers,
        columns,
        filled_cells,
    };
    if let Some(n) = cfg.lookback {
        table = table.tail(n);
    }
    if table.len() < cfg.min_rows {
        return Err(Btcm7Error::InsufficientHistory {
            required: cfg.min_rows,
            available: table.len(),
        });
    }
    Ok(table)
}
