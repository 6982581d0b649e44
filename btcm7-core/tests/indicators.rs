use std::collections::BTreeMap;

use btcm7_core::{
    AlignedTable, BasketWeights, Btcm7Error, IndicatorConfig, IndicatorEngine, Signal, Ticker,
    compute,
};
use chrono::NaiveDate;

fn days(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| start + chrono::Days::new(i as u64))
        .collect()
}

fn table(btc: &[f64], equities: &[(&str, Vec<f64>)]) -> AlignedTable {
    let mut tickers = vec![Ticker::crypto("BTC/USD").unwrap()];
    let mut cols = BTreeMap::from([("BTC/USD".to_string(), btc.to_vec())]);
    for (sym, col) in equities {
        tickers.push(Ticker::equity(sym).unwrap());
        cols.insert((*sym).to_string(), col.clone());
    }
    AlignedTable::from_columns(days(btc.len()), tickers, cols).unwrap()
}

fn small_cfg() -> IndicatorConfig {
    let mut cfg = IndicatorConfig::default();
    cfg.momentum_windows = vec![1, 2];
    cfg.zscore_lookback = 3;
    cfg.signal.short_window = 1;
    cfg.signal.medium_window = 2;
    cfg
}

#[test]
fn ratio_is_exact_at_parity() {
    let t = table(
        &[50_000.0, 51_000.0, 49_000.0],
        &[("AAPL", vec![500.0, 510.0, 490.0])],
    );
    let ind = compute(&t, &small_cfg()).unwrap();
    assert_eq!(ind.ratio, vec![10_000.0, 10_000.0, 10_000.0]);
    assert_eq!(ind.basket, vec![500.0, 510.0, 490.0]);
    // Constant ratio: every defined Z-score window is degenerate.
    assert!(ind.zscore.iter().all(Option::is_none));
    assert_eq!(ind.latest.signal, Signal::Neutral);
}

#[test]
fn equal_weights_average_the_basket() {
    let t = table(
        &[100.0, 110.0],
        &[("AAPL", vec![10.0, 12.0]), ("MSFT", vec![30.0, 28.0])],
    );
    let ind = compute(&t, &small_cfg()).unwrap();
    assert_eq!(ind.weights.get("AAPL"), Some(&0.5));
    assert_eq!(ind.basket, vec![20.0, 20.0]);
    assert_eq!(ind.ratio, vec![500.0, 550.0]);
    let m1 = ind.momentum(1).unwrap();
    assert_eq!(m1[0], None);
    assert!((m1[1].unwrap() - 10.0).abs() < 1e-9);
}

#[test]
fn custom_weights_must_sum_to_one() {
    let t = table(
        &[100.0, 110.0],
        &[("AAPL", vec![10.0, 12.0]), ("MSFT", vec![30.0, 28.0])],
    );
    let mut cfg = small_cfg();
    cfg.basket_weights = BasketWeights::Custom(BTreeMap::from([
        ("AAPL".to_string(), 0.25),
        ("MSFT".to_string(), 0.25),
    ]));
    assert!(matches!(compute(&t, &cfg), Err(Btcm7Error::InvalidConfig(_))));

    cfg.basket_weights = BasketWeights::Custom(BTreeMap::from([
        ("AAPL".to_string(), 0.25),
        ("MSFT".to_string(), 0.75),
    ]));
    let ind = compute(&t, &cfg).unwrap();
    assert_eq!(ind.basket, vec![25.0, 24.0]);
}

#[test]
fn custom_weights_must_match_the_basket() {
    let t = table(&[100.0], &[("AAPL", vec![10.0]), ("MSFT", vec![30.0])]);
    let mut cfg = small_cfg();
    cfg.basket_weights = BasketWeights::Custom(BTreeMap::from([("AAPL".to_string(), 1.0)]));
    assert!(matches!(compute(&t, &cfg), Err(Btcm7Error::InvalidConfig(_))));

    cfg.basket_weights = BasketWeights::Custom(BTreeMap::from([
        ("AAPL".to_string(), 0.5),
        ("MSFT".to_string(), 0.5),
        ("TSLA".to_string(), 0.0),
    ]));
    assert!(matches!(compute(&t, &cfg), Err(Btcm7Error::InvalidConfig(_))));

    cfg.basket_weights = BasketWeights::Custom(BTreeMap::from([
        ("AAPL".to_string(), 1.5),
        ("MSFT".to_string(), -0.5),
    ]));
    assert!(matches!(compute(&t, &cfg), Err(Btcm7Error::InvalidConfig(_))));
}

#[test]
fn zero_windows_are_rejected() {
    let mut cfg = small_cfg();
    cfg.momentum_windows = vec![0];
    assert!(IndicatorEngine::new(cfg).is_err());
    let mut cfg = small_cfg();
    cfg.zscore_lookback = 0;
    assert!(IndicatorEngine::new(cfg).is_err());
}

#[test]
fn table_needs_one_benchmark_and_an_equity() {
    let only_btc = AlignedTable::from_columns(
        days(2),
        vec![Ticker::crypto("BTC/USD").unwrap()],
        BTreeMap::from([("BTC/USD".to_string(), vec![1.0, 2.0])]),
    )
    .unwrap();
    assert!(matches!(
        compute(&only_btc, &small_cfg()),
        Err(Btcm7Error::InvalidConfig(_))
    ));

    let two_crypto = AlignedTable::from_columns(
        days(1),
        vec![
            Ticker::crypto("BTC/USD").unwrap(),
            Ticker::crypto("ETH/USD").unwrap(),
            Ticker::equity("AAPL").unwrap(),
        ],
        BTreeMap::from([
            ("BTC/USD".to_string(), vec![1.0]),
            ("ETH/USD".to_string(), vec![1.0]),
            ("AAPL".to_string(), vec![1.0]),
        ]),
    )
    .unwrap();
    assert!(matches!(
        compute(&two_crypto, &small_cfg()),
        Err(Btcm7Error::InvalidConfig(_))
    ));
}

#[test]
fn zscore_defined_from_lookback_minus_one() {
    let btc = [100.0, 101.0, 103.0, 102.0, 106.0, 104.0];
    let t = table(&btc, &[("AAPL", vec![10.0; 6])]);
    let ind = compute(&t, &small_cfg()).unwrap();
    assert_eq!(ind.zscore[0], None);
    assert_eq!(ind.zscore[1], None);
    for z in &ind.zscore[2..] {
        assert!(z.is_some_and(f64::is_finite));
    }
}

#[test]
fn latest_metrics_and_constituents() {
    let t = table(
        &[100.0, 105.0, 120.0],
        &[("AAPL", vec![10.0, 10.0, 11.0]), ("MSFT", vec![10.0, 10.0, 9.0])],
    );
    let ind = compute(&t, &small_cfg()).unwrap();
    let latest = &ind.latest;
    assert_eq!(latest.day, *ind.days.last().unwrap());
    assert!((latest.btc_change_pct - 20.0).abs() < 1e-9);
    assert!(latest.basket_change_pct.abs() < 1e-9);
    // 1-day: btc +14.29%, basket 0% ; 2-day: +20% vs 0%.
    assert_eq!(latest.signal, Signal::StrongBtc);

    let changes: Vec<(&str, f64)> = ind
        .constituents
        .iter()
        .map(|c| (c.symbol.as_str(), c.change_pct))
        .collect();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].0, "AAPL");
    assert!((changes[0].1 - 10.0).abs() < 1e-9);
    assert!((changes[1].1 + 10.0).abs() < 1e-9);

    assert_eq!(ind.btc_normalized[0], 100.0);
    assert!((ind.btc_normalized[2] - 120.0).abs() < 1e-9);
}

#[test]
fn rows_follow_days() {
    let t = table(&[1.0, 2.0, 3.0], &[("AAPL", vec![1.0, 1.0, 1.0])]);
    let ind = compute(&t, &small_cfg()).unwrap();
    let rows: Vec<_> = ind.rows().collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].day, ind.days[2]);
    assert_eq!(rows[2].ratio, 300.0);
    assert_eq!(rows[0].momentum.get(&1), Some(&None));
}

#[test]
fn wide_tolerance_cannot_admit_zero_weights() {
    let t = table(&[1.0, 2.0, 3.0], &[("AAPL", vec![1.0, 1.0, 1.0])]);
    let mut cfg = small_cfg();
    cfg.basket_weights = BasketWeights::Custom(BTreeMap::from([("AAPL".to_string(), 0.0)]));
    cfg.weight_tolerance = 1.0;
    assert!(matches!(compute(&t, &cfg), Err(Btcm7Error::InvalidConfig(_))));
    assert!(IndicatorEngine::new(cfg).is_err());
}

#[test]
fn short_columns_end_rows_instead_of_panicking() {
    let t = table(&[1.0, 2.0, 3.0], &[("AAPL", vec![1.0, 1.0, 1.0])]);
    let full = compute(&t, &small_cfg()).unwrap();

    let mut ind = full.clone();
    ind.ratio.truncate(2);
    assert!(ind.row(2).is_none());
    assert_eq!(ind.rows().count(), 2);

    let mut ind = full.clone();
    ind.zscore.clear();
    assert_eq!(ind.rows().count(), 0);

    let mut ind = full;
    if let Some(series) = ind.momentum.get_mut(&2) {
        series.truncate(1);
    }
    assert!(ind.row(0).is_some());
    assert!(ind.row(1).is_none());

    // A decoded document with ragged columns behaves the same way.
    let mut doc = serde_json::to_value(compute(&t, &small_cfg()).unwrap()).unwrap();
    doc["btc"] = serde_json::json!([1.0]);
    let decoded: btcm7_core::Indicators = serde_json::from_value(doc).unwrap();
    assert_eq!(decoded.rows().count(), 1);
}

#[test]
fn empty_table_is_insufficient_history() {
    let t = table(&[], &[("AAPL", vec![])]);
    assert!(matches!(
        compute(&t, &small_cfg()),
        Err(Btcm7Error::InsufficientHistory { .. })
    ));
}
