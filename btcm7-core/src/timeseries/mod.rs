//! Time-series utilities shared by connectors and the orchestrator.
//!
//! Modules include:
//! - `align`: join per-ticker close series onto one trading-day index
//! - `util`: price and day-order invariants
/// Alignment of raw series into an `AlignedTable`.
pub mod align;
/// Shared invariant checks for price series.
pub mod util;
