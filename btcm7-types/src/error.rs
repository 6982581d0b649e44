use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the btcm7 workspace.
///
/// Covers provider failures (unknown tickers, rate limits, outages), pipeline
/// failures (insufficient history, invalid configuration), and the per-ticker
/// and aggregate wrappers used when a refresh fans out over many instruments.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Btcm7Error {
    /// The provider does not know the requested symbol. Never retried.
    #[error("unknown ticker: {symbol}")]
    UnknownTicker {
        /// Symbol that the provider rejected.
        symbol: String,
    },

    /// The provider (or the local quota) refused the call because of rate limits.
    #[error("{connector} rate limited (retry_after_ms={retry_after_ms:?})")]
    ProviderRateLimited {
        /// Connector name that reported the limit.
        connector: String,
        /// Hint for how long to wait before the next attempt, when known.
        retry_after_ms: Option<u64>,
    },

    /// Network failure, timeout, 5xx, or a malformed payload from the provider.
    #[error("{connector} unavailable: {msg}")]
    ProviderUnavailable {
        /// Connector name that failed.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The aligned table is too short for the rolling windows used downstream.
    #[error("insufficient history: required={required} available={available}")]
    InsufficientHistory {
        /// Minimum number of aligned rows needed.
        required: usize,
        /// Rows actually available after alignment.
        available: usize,
    },

    /// Configuration rejected during validation (weights, windows, credentials).
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Issues with returned or expected data (duplicate days, bad prices, etc.).
    #[error("data issue: {0}")]
    Data(String),

    /// The overall request exceeded the configured deadline.
    #[error("request timed out: {capability}")]
    RequestTimeout {
        /// Label of the operation that timed out (e.g. "refresh").
        capability: String,
    },

    /// A failure attributed to one ticker of a multi-ticker refresh.
    #[error("{symbol}: {error}")]
    Ticker {
        /// Symbol whose fetch failed.
        symbol: String,
        /// Underlying failure.
        error: Box<Btcm7Error>,
    },

    /// Several tickers failed within the same refresh; contains each failure.
    #[error("refresh failed: {0:?}")]
    RefreshFailed(Vec<Btcm7Error>),
}

impl Btcm7Error {
    /// Helper: build an `UnknownTicker` error.
    pub fn unknown_ticker(symbol: impl Into<String>) -> Self {
        Self::UnknownTicker {
            symbol: symbol.into(),
        }
    }

    /// Helper: build a `ProviderRateLimited` error.
    pub fn rate_limited(connector: impl Into<String>, retry_after_ms: Option<u64>) -> Self {
        Self::ProviderRateLimited {
            connector: connector.into(),
            retry_after_ms,
        }
    }

    /// Helper: build a `ProviderUnavailable` error with the connector name and message.
    pub fn unavailable(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `RequestTimeout` error.
    #[must_use]
    pub fn request_timeout(capability: impl Into<String>) -> Self {
        Self::RequestTimeout {
            capability: capability.into(),
        }
    }

    /// Helper: attribute an error to a ticker. Already-tagged errors are kept as-is.
    #[must_use]
    pub fn for_ticker(symbol: impl Into<String>, error: Self) -> Self {
        match error {
            e @ Self::Ticker { .. } => e,
            other => Self::Ticker {
                symbol: symbol.into(),
                error: Box::new(other),
            },
        }
    }

    /// Returns true for transient provider failures that a retry may resolve.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ProviderRateLimited { .. } | Self::ProviderUnavailable { .. } => true,
            Self::Ticker { error, .. } => error.is_retryable(),
            _ => false,
        }
    }

    /// Returns the provider's wait hint when this is a rate-limit error.
    #[must_use]
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::ProviderRateLimited { retry_after_ms, .. } => *retry_after_ms,
            Self::Ticker { error, .. } => error.retry_after_ms(),
            _ => None,
        }
    }

    /// Returns true if this error should be surfaced to users as actionable.
    ///
    /// Unknown tickers and configuration errors require user intervention;
    /// aggregates are classified based on their contents.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        match self {
            Self::UnknownTicker { .. } | Self::InvalidConfig(_) | Self::InvalidArg(_) => true,
            Self::Ticker { error, .. } => error.is_actionable(),
            Self::RefreshFailed(inner) => inner.iter().any(Self::is_actionable),
            _ => false,
        }
    }

    /// Flatten nested `RefreshFailed` structures into a plain vector.
    ///
    /// This preserves other error variants as-is and unwraps recursively.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::RefreshFailed(list) => list.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}
