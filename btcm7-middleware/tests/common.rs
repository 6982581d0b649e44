#![allow(dead_code)]

use btcm7_core::{SeriesRequest, Ticker};
use chrono::NaiveDate;

pub fn aapl() -> Ticker {
    Ticker::equity("AAPL").unwrap()
}

pub fn march() -> SeriesRequest {
    SeriesRequest::daily(
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
    )
    .unwrap()
}
