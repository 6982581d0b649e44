//! Configuration types shared across the client stack, the aligner, and the
//! indicator engine.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Btcm7Error;
use crate::ticker::M7_MARKET_CAPS_TRILLIONS;

/// Bar interval requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Interval {
    /// One bar per trading day.
    #[default]
    Daily,
    /// One bar per week.
    Weekly,
    /// One bar per month.
    Monthly,
}

impl Interval {
    /// Provider wire name (`1day`, `1week`, `1month`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "1day",
            Self::Weekly => "1week",
            Self::Monthly => "1month",
        }
    }

    /// Earliest start such that `[start, end]` holds at least `bars` bars.
    ///
    /// Daily ranges allow two weekend days per five sessions plus two weeks
    /// of exchange holidays.
    #[must_use]
    pub fn start_covering(self, end: NaiveDate, bars: usize) -> NaiveDate {
        let bars = u64::try_from(bars).unwrap_or(u64::MAX);
        let start = match self {
            Self::Daily => bars
                .div_ceil(5)
                .checked_mul(7)
                .and_then(|days| end.checked_sub_days(Days::new(days.saturating_add(14)))),
            Self::Weekly => bars
                .checked_add(1)
                .and_then(|weeks| weeks.checked_mul(7))
                .and_then(|days| end.checked_sub_days(Days::new(days))),
            Self::Monthly => u32::try_from(bars.saturating_add(1))
                .ok()
                .and_then(|months| end.checked_sub_months(Months::new(months))),
        };
        start.unwrap_or(NaiveDate::MIN)
    }
}

/// Lookback range presets for a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Period {
    /// One month.
    M1,
    /// Three months.
    M3,
    /// Six months.
    M6,
    /// One year.
    #[default]
    Y1,
    /// Two years.
    Y2,
    /// Five years.
    Y5,
}

impl Period {
    /// Length of the period in calendar months.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::M1 => 1,
            Self::M3 => 3,
            Self::M6 => 6,
            Self::Y1 => 12,
            Self::Y2 => 24,
            Self::Y5 => 60,
        }
    }

    /// First day of the period ending at `end` (inclusive).
    #[must_use]
    pub fn start_for(self, end: NaiveDate) -> NaiveDate {
        end.checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Start of a fetch ending at `end` that spans the whole period and at
    /// least `warmup_bars` bars of `interval`, whichever reaches further back.
    #[must_use]
    pub fn fetch_start(self, interval: Interval, end: NaiveDate, warmup_bars: usize) -> NaiveDate {
        self.start_for(end)
            .min(interval.start_covering(end, warmup_bars))
    }
}

/// Bounded exponential backoff for transient provider failures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first call (>= 1).
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds.
    pub min_backoff_ms: u64,
    /// Upper bound for a single delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Exponential factor applied after each failed attempt (>= 1).
    pub factor: u32,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
    /// Timeout applied to every individual attempt.
    pub attempt_timeout: Duration,
    /// Upper bound on the time spent in one retry sequence, sleeps included.
    pub max_elapsed: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            min_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            factor: 2,
            jitter_percent: 20,
            attempt_timeout: Duration::from_secs(10),
            max_elapsed: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// Check bounds.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for zero attempts, a zero factor, jitter above
    /// 100%, or `min_backoff_ms > max_backoff_ms`.
    pub fn validate(&self) -> Result<(), Btcm7Error> {
        if self.max_attempts == 0 {
            return Err(Btcm7Error::InvalidConfig("retry max_attempts must be >= 1".into()));
        }
        if self.factor == 0 {
            return Err(Btcm7Error::InvalidConfig("retry factor must be >= 1".into()));
        }
        if self.jitter_percent > 100 {
            return Err(Btcm7Error::InvalidConfig(
                "retry jitter_percent must be within [0, 100]".into(),
            ));
        }
        if self.min_backoff_ms > self.max_backoff_ms {
            return Err(Btcm7Error::InvalidConfig(
                "retry min_backoff_ms exceeds max_backoff_ms".into(),
            ));
        }
        Ok(())
    }
}

/// Strategy for consuming units from a quota when handling requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum QuotaConsumptionStrategy {
    /// Allow up to `limit` calls anywhere inside the window.
    #[default]
    Burst,
    /// Space calls evenly: at most one call per `window / limit`.
    EvenSpread,
}

/// Client-side request budget mirroring the provider's requests-per-minute quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Maximum number of calls within a single window.
    pub limit: u64,
    /// Duration of the accounting window.
    pub window: Duration,
    /// How calls consume the budget.
    pub strategy: QuotaConsumptionStrategy,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        // Twelve Data free tier: 8 requests per minute.
        Self {
            limit: 8,
            window: Duration::from_secs(60),
            strategy: QuotaConsumptionStrategy::Burst,
        }
    }
}

impl QuotaConfig {
    /// Check bounds.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for a zero limit or a zero window; either would
    /// refuse every call.
    pub fn validate(&self) -> Result<(), Btcm7Error> {
        if self.limit == 0 {
            return Err(Btcm7Error::InvalidConfig("quota limit must be >= 1".into()));
        }
        if self.window.is_zero() {
            return Err(Btcm7Error::InvalidConfig("quota window must be positive".into()));
        }
        Ok(())
    }
}

/// Freshness cache for fetched series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live in milliseconds; 0 disables caching.
    pub ttl_ms: u64,
    /// Maximum number of cached series.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 5 * 60 * 1_000,
            max_entries: 256,
        }
    }
}

/// How days missing for some tickers are handled during alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum GapPolicy {
    /// Keep only days observed by every ticker.
    Intersection,
    /// Union of all days; carry a ticker's last close forward for at most
    /// `max_gap` consecutive days, otherwise drop the day.
    ForwardFill {
        /// Maximum consecutive filled days per ticker.
        max_gap: usize,
    },
}

impl Default for GapPolicy {
    fn default() -> Self {
        // Covers a weekend plus a one-day exchange holiday.
        Self::ForwardFill { max_gap: 3 }
    }
}

/// Settings for the series aligner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlignConfig {
    /// Gap handling policy.
    pub policy: GapPolicy,
    /// Keep only the most recent `lookback` rows, if set.
    pub lookback: Option<usize>,
    /// Minimum number of rows the aligned table must contain.
    pub min_rows: usize,
}

/// Basket weighting scheme.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum BasketWeights {
    /// 1/N across every equity in the table.
    #[default]
    Equal,
    /// Explicit symbol → weight mapping; must sum to 1.0 within tolerance.
    Custom(BTreeMap<String, f64>),
}

impl BasketWeights {
    /// Market-cap weights over the default constituents, normalized to sum 1.
    #[must_use]
    pub fn market_cap_default() -> Self {
        let total: f64 = M7_MARKET_CAPS_TRILLIONS.iter().map(|(_, cap)| cap).sum();
        Self::Custom(
            M7_MARKET_CAPS_TRILLIONS
                .iter()
                .map(|(s, cap)| ((*s).to_string(), cap / total))
                .collect(),
        )
    }
}

/// Thresholds for the summary signal derived from two momentum windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Short momentum window.
    pub short_window: usize,
    /// Medium momentum window.
    pub medium_window: usize,
    /// Both windows beyond this (percentage points) → strong signal.
    pub strong_threshold: f64,
    /// Either window beyond this → moderate signal.
    pub moderate_threshold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            short_window: 7,
            medium_window: 30,
            strong_threshold: 5.0,
            moderate_threshold: 2.0,
        }
    }
}

// Exclusive upper bound for `IndicatorConfig::weight_tolerance`.
const MAX_WEIGHT_TOLERANCE: f64 = 0.5;

/// Settings for the indicator engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    /// Basket weighting.
    pub basket_weights: BasketWeights,
    /// Momentum windows in rows (trading days for daily data).
    pub momentum_windows: Vec<usize>,
    /// Rolling window for the ratio Z-score.
    pub zscore_lookback: usize,
    /// Allowed deviation of the weight sum from 1.0.
    pub weight_tolerance: f64,
    /// Summary signal settings.
    pub signal: SignalConfig,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            basket_weights: BasketWeights::Equal,
            momentum_windows: vec![7, 30],
            zscore_lookback: 90,
            weight_tolerance: 1e-6,
            signal: SignalConfig::default(),
        }
    }
}

impl IndicatorConfig {
    /// Validate everything that does not depend on the table contents.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for empty or zero windows, a zero lookback, a
    /// tolerance outside `[0, 0.5)`, or a non-finite threshold.
    pub fn validate(&self) -> Result<(), Btcm7Error> {
        if self.momentum_windows.is_empty() {
            return Err(Btcm7Error::InvalidConfig("no momentum windows configured".into()));
        }
        if self.momentum_windows.contains(&0) {
            return Err(Btcm7Error::InvalidConfig("momentum windows must be positive".into()));
        }
        if self.zscore_lookback == 0 {
            return Err(Btcm7Error::InvalidConfig("zscore lookback must be positive".into()));
        }
        if self.signal.short_window == 0 || self.signal.medium_window == 0 {
            return Err(Btcm7Error::InvalidConfig("signal windows must be positive".into()));
        }
        if !(0.0..MAX_WEIGHT_TOLERANCE).contains(&self.weight_tolerance) {
            return Err(Btcm7Error::InvalidConfig(format!(
                "weight tolerance must be within [0, {MAX_WEIGHT_TOLERANCE})"
            )));
        }
        let SignalConfig {
            strong_threshold,
            moderate_threshold,
            ..
        } = self.signal;
        if !(strong_threshold.is_finite() && moderate_threshold.is_finite()) {
            return Err(Btcm7Error::InvalidConfig("signal thresholds must be finite".into()));
        }
        Ok(())
    }

    /// Rows needed before every configured window produces a value.
    #[must_use]
    pub fn min_history(&self) -> usize {
        let longest = self
            .momentum_windows
            .iter()
            .copied()
            .chain([self.signal.short_window, self.signal.medium_window])
            .max()
            .unwrap_or(0);
        (longest + 1).max(self.zscore_lookback)
    }
}

/// Global configuration for the `Btcm7` orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Btcm7Config {
    /// Bar interval requested from the provider.
    pub interval: Interval,
    /// Lookback used by `refresh()`.
    pub period: Period,
    /// Maximum concurrent per-ticker fetches.
    pub max_concurrency: usize,
    /// Upper bound for one ticker's fetch, retries included.
    pub provider_timeout: Duration,
    /// Optional deadline for the whole fetch fan-out.
    pub request_timeout: Option<Duration>,
    /// Alignment settings.
    pub align: AlignConfig,
    /// Indicator settings.
    pub indicators: IndicatorConfig,
    /// Number of previous snapshots kept for display by the monitor.
    pub history_capacity: usize,
}

impl Default for Btcm7Config {
    fn default() -> Self {
        Self {
            interval: Interval::Daily,
            period: Period::Y1,
            max_concurrency: 8,
            provider_timeout: Duration::from_secs(180),
            request_timeout: None,
            align: AlignConfig::default(),
            indicators: IndicatorConfig::default(),
            history_capacity: 16,
        }
    }
}
