//! btcm7-specific configuration primitives, ticker definitions, and the
//! workspace error type.
#![warn(missing_docs)]

mod config;
mod connector;
mod error;
mod ticker;

pub use config::{
    AlignConfig, BasketWeights, Btcm7Config, CacheConfig, GapPolicy, IndicatorConfig, Interval,
    Period, QuotaConfig, QuotaConsumptionStrategy, RetryConfig, SignalConfig,
};
pub use connector::ConnectorKey;
pub use error::Btcm7Error;
pub use ticker::{
    AssetClass, DEFAULT_BTC_SYMBOL, M7_CONSTITUENTS, M7_MARKET_CAPS_TRILLIONS, Ticker, TickerSet,
};
