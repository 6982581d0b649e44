//! Re-export of foundational types from `btcm7-types`.
// Consolidated re-exports so downstream crates can depend on `btcm7-core` only

pub use btcm7_types::{AssetClass, Btcm7Error, ConnectorKey, Ticker, TickerSet};
pub use btcm7_types::{
    AlignConfig, BasketWeights, Btcm7Config, CacheConfig, GapPolicy, IndicatorConfig, Interval,
    Period, QuotaConfig, QuotaConsumptionStrategy, RetryConfig, SignalConfig,
};
pub use btcm7_types::{DEFAULT_BTC_SYMBOL, M7_CONSTITUENTS, M7_MARKET_CAPS_TRILLIONS};
