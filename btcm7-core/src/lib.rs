//! btcm7-core
//!
//! Core types, traits, and computations shared across the btcm7 workspace.
//!
//! - `series`: validated raw price series and fetch requests.
//! - `connector`: the `Btcm7Connector` trait and the `SeriesProvider` capability.
//! - `middleware`: trait implemented by connector wrappers (cache, quota, retry).
//! - `timeseries`: alignment of per-ticker series onto a common day index.
//! - `indicators`: basket, ratio, momentum, Z-score, and the summary signal.
#![warn(missing_docs)]

/// Connector capability traits and the primary `Btcm7Connector` interface.
pub mod connector;
/// Indicator engine and derived series.
pub mod indicators;
/// Middleware trait implemented by connector wrappers.
pub mod middleware;
/// Raw series and request types.
pub mod series;
/// Time-series alignment utilities.
pub mod timeseries;
pub mod types;

pub use connector::{Btcm7Connector, SeriesProvider};
pub use indicators::{
    ConstituentChange, IndicatorEngine, IndicatorRow, Indicators, LatestMetrics, Signal, compute,
};
pub use middleware::Middleware;
pub use series::{PricePoint, RawSeries, SeriesRequest};
pub use timeseries::align::{AlignedTable, align};
pub use types::*;
