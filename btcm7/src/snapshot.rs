//! Immutable result of one successful refresh.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use btcm7_core::{
    AlignedTable, IndicatorRow, Indicators, Interval, LatestMetrics, Signal, TickerSet,
};

/// Everything a presenter needs to render one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Instruments that were requested.
    pub tickers: TickerSet,
    /// First requested day.
    pub start: NaiveDate,
    /// Last requested day.
    pub end: NaiveDate,
    /// Bar interval of the underlying series.
    pub interval: Interval,
    /// Aligned closes the indicators were computed from.
    pub table: AlignedTable,
    /// Derived series and summary metrics.
    pub indicators: Indicators,
    /// Oldest `fetched_at` among the input series; earlier than `created_at`
    /// when some series came from the cache.
    pub data_as_of: DateTime<Utc>,
    /// When this snapshot was assembled.
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    /// Metrics for the last aligned day.
    #[must_use]
    pub const fn latest(&self) -> &LatestMetrics {
        &self.indicators.latest
    }

    /// Summary stance for the last aligned day.
    #[must_use]
    pub const fn signal(&self) -> Signal {
        self.indicators.latest.signal
    }

    /// Per-day indicator rows, oldest first.
    pub fn rows(&self) -> impl Iterator<Item = IndicatorRow> + '_ {
        self.indicators.rows()
    }

    /// Number of aligned days.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True when no days survived alignment; never the case for a published snapshot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Serialize to pretty JSON for presenters that consume a document.
    ///
    /// # Errors
    /// Returns `Data` if serialization fails.
    pub fn to_json(&self) -> Result<String, btcm7_core::Btcm7Error> {
        serde_json::to_string_pretty(self)
            .map_err(|e| btcm7_core::Btcm7Error::Data(format!("snapshot serialization: {e}")))
    }
}
