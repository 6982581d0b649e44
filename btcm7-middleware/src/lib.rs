//! btcm7-middleware
//!
//! Wrappers that sit between the orchestrator and a raw provider connector:
//!
//! - `CachingConnector`: freshness cache for fetched series (moka, TTL + capacity)
//! - `RetryingConnector`: bounded exponential backoff with jitter
//! - `QuotaAwareConnector`: client-side requests-per-window budget
//!
//! Compose them with [`ConnectorBuilder`].
#![warn(missing_docs)]

mod builder;
mod cache;
mod quota;
mod retry;

pub use crate::builder::ConnectorBuilder;
pub use crate::cache::{CacheMiddleware, CachingConnector};
pub use crate::quota::{QuotaAwareConnector, QuotaMiddleware};
pub use crate::retry::{RetryMiddleware, RetryingConnector, backoff_delay};
