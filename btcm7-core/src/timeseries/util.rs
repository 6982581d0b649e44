//! Shared helpers for close-series invariants.

use chrono::NaiveDate;

use crate::series::PricePoint;
use btcm7_types::{Btcm7Error, Ticker};

/// Ensure a close is finite and strictly positive.
///
/// # Errors
/// Returns `Err(Btcm7Error::Data)` naming the ticker and day otherwise.
pub fn ensure_valid_close(ticker: &Ticker, p: &PricePoint) -> Result<(), Btcm7Error> {
    if p.close.is_finite() && p.close > 0.0 {
        Ok(())
    } else {
        Err(Btcm7Error::Data(format!(
            "invalid close {} for {ticker} on {}",
            p.close, p.day
        )))
    }
}

/// Ensure days are strictly increasing (sorted, no duplicates).
///
/// # Errors
/// Returns `Err(Btcm7Error::Data)` at the first out-of-order or repeated day.
pub fn ensure_strictly_increasing(days: &[NaiveDate]) -> Result<(), Btcm7Error> {
    match days.windows(2).find(|w| w[0] >= w[1]) {
        Some(w) => Err(Btcm7Error::Data(format!(
            "days not strictly increasing at {} -> {}",
            w[0], w[1]
        ))),
        None => Ok(()),
    }
}
