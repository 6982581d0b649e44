use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timeseries::util::ensure_valid_close;
use btcm7_types::{Btcm7Error, Interval, Ticker};

/// One close observation for one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading day.
    pub day: NaiveDate,
    /// Closing price; finite and strictly positive.
    pub close: f64,
}

impl PricePoint {
    /// Convenience constructor.
    #[must_use]
    pub const fn new(day: NaiveDate, close: f64) -> Self {
        Self { day, close }
    }
}

/// Close series for one ticker, ordered by day with at most one point per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    ticker: Ticker,
    points: Vec<PricePoint>,
    fetched_at: DateTime<Utc>,
}

impl RawSeries {
    /// Build a series stamped with the current time.
    ///
    /// # Errors
    /// See [`RawSeries::with_fetched_at`].
    pub fn new(ticker: Ticker, points: Vec<PricePoint>) -> Result<Self, Btcm7Error> {
        Self::with_fetched_at(ticker, points, Utc::now())
    }

    /// Build a series, sorting points by day.
    ///
    /// # Errors
    /// Returns `Btcm7Error::Data` if two points share a day or any close is
    /// non-finite or not strictly positive.
    pub fn with_fetched_at(
        ticker: Ticker,
        mut points: Vec<PricePoint>,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, Btcm7Error> {
        points.sort_by_key(|p| p.day);
        for p in &points {
            ensure_valid_close(&ticker, p)?;
        }
        if let Some(w) = points.windows(2).find(|w| w[0].day == w[1].day) {
            return Err(Btcm7Error::Data(format!(
                "duplicate day {} in series for {ticker}",
                w[0].day
            )));
        }
        Ok(Self {
            ticker,
            points,
            fetched_at,
        })
    }

    /// Ticker this series belongs to.
    #[must_use]
    pub const fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Points in ascending day order.
    #[must_use]
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// When the series was retrieved from the provider.
    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the provider returned no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First and last observed day, if any.
    #[must_use]
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.points.first()?.day, self.points.last()?.day))
    }
}

/// Inclusive date range and interval for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesRequest {
    start: NaiveDate,
    end: NaiveDate,
    interval: Interval,
}

impl SeriesRequest {
    /// Validate and build a request.
    ///
    /// # Errors
    /// Returns `InvalidArg` when `start > end`.
    pub fn try_new(start: NaiveDate, end: NaiveDate, interval: Interval) -> Result<Self, Btcm7Error> {
        if start > end {
            return Err(Btcm7Error::InvalidArg(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self {
            start,
            end,
            interval,
        })
    }

    /// Daily request shorthand.
    ///
    /// # Errors
    /// See [`SeriesRequest::try_new`].
    pub fn daily(start: NaiveDate, end: NaiveDate) -> Result<Self, Btcm7Error> {
        Self::try_new(start, end, Interval::Daily)
    }

    /// First day (inclusive).
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day (inclusive).
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Bar interval.
    #[must_use]
    pub const fn interval(&self) -> Interval {
        self.interval
    }
}
