#![allow(dead_code)]

use std::sync::Arc;

use btcm7::{Btcm7Builder, Btcm7Connector, Ticker, TickerSet};
use btcm7_mock::MockConnector;
use chrono::NaiveDate;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// First half of 2024: 182 calendar days, 130 weekdays.
pub fn h1_2024() -> (NaiveDate, NaiveDate) {
    (d(2024, 1, 1), d(2024, 6, 30))
}

pub fn mock_builder() -> Btcm7Builder {
    let mock: Arc<dyn Btcm7Connector> = Arc::new(MockConnector::new());
    btcm7::Btcm7::builder().with_connector(mock)
}

pub fn set_with(equities: &[&str]) -> TickerSet {
    TickerSet::new(
        Ticker::crypto("BTC/USD").unwrap(),
        equities.iter().map(|s| Ticker::equity(s).unwrap()).collect(),
    )
    .unwrap()
}
