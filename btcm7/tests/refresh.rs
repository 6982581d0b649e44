mod helpers;

use std::collections::BTreeMap;
use std::time::Duration;

use btcm7::{
    AssetClass, BasketWeights, Btcm7, Btcm7Error, ConnectorBuilder, GapPolicy, Interval, Period,
    Signal, Snapshot,
};
use btcm7_core::{CacheConfig, QuotaConfig, RetryConfig};
use btcm7_mock::{DynamicMockConnector, MockBehavior};
use helpers::{d, h1_2024, mock_builder, set_with};

#[tokio::test]
async fn refresh_range_builds_full_snapshot() {
    let app = mock_builder().build().unwrap();
    let (start, end) = h1_2024();
    let snap = app.refresh_range(start, end).await.unwrap();

    assert_eq!(snap.len(), 182);
    assert_eq!(snap.table.tickers().len(), 8);
    assert_eq!(snap.table.tickers_of(AssetClass::Crypto).count(), 1);
    assert_eq!(snap.start, start);
    assert_eq!(snap.end, end);
    assert_eq!(snap.interval, Interval::Daily);
    assert!(snap.table.filled_cells() > 0);
    assert!(snap.data_as_of <= snap.created_at);

    let latest = snap.latest();
    assert_eq!(latest.day, end);
    assert!(latest.ratio > 0.0);
    assert!(latest.zscore.is_some_and(f64::is_finite));
    assert!(latest.momentum.get(&7).copied().flatten().is_some());
    assert!(latest.momentum.get(&30).copied().flatten().is_some());
    assert_eq!(snap.indicators.constituents.len(), 7);

    assert_eq!(snap.rows().count(), 182);
    assert!(snap.rows().all(|r| r.ratio > 0.0));
    // Z-score is undefined until the lookback fills.
    assert!(snap.rows().take(89).all(|r| r.zscore.is_none()));
}

#[tokio::test]
async fn every_interval_and_period_preset_produces_a_snapshot() {
    let end = d(2024, 6, 28);
    for interval in [Interval::Daily, Interval::Weekly, Interval::Monthly] {
        for period in [
            Period::M1,
            Period::M3,
            Period::M6,
            Period::Y1,
            Period::Y2,
            Period::Y5,
        ] {
            let app = mock_builder()
                .interval(interval)
                .period(period)
                .build()
                .unwrap();
            let start = app.fetch_start(end);
            assert!(start <= period.start_for(end), "{interval:?} {period:?}");
            let snap = app
                .refresh_range(start, end)
                .await
                .unwrap_or_else(|e| panic!("{interval:?} {period:?}: {e}"));
            assert!(snap.len() >= app.required_rows(), "{interval:?} {period:?}");
            assert_eq!(snap.interval, interval);
            assert!(snap.latest().zscore.is_some_and(f64::is_finite));
        }
    }
}

#[tokio::test]
async fn long_daily_period_is_not_widened() {
    let app = mock_builder().period(Period::Y2).build().unwrap();
    let end = d(2024, 6, 28);
    assert_eq!(app.fetch_start(end), d(2022, 6, 28));
}

#[tokio::test]
async fn intersection_keeps_only_common_days() {
    let app = mock_builder()
        .gap_policy(GapPolicy::Intersection)
        .build()
        .unwrap();
    let (start, end) = h1_2024();
    let snap = app.refresh_range(start, end).await.unwrap();
    assert_eq!(snap.len(), 130);
    assert_eq!(snap.table.filled_cells(), 0);
}

#[tokio::test]
async fn refresh_is_deterministic_for_the_same_range() {
    let app = mock_builder().build().unwrap();
    let (start, end) = h1_2024();
    let a = app.refresh_range(start, end).await.unwrap();
    let b = app.refresh_range(start, end).await.unwrap();
    assert_eq!(a.table, b.table);
    assert_eq!(a.indicators, b.indicators);
}

#[tokio::test]
async fn inverted_range_is_rejected_before_fetching() {
    let (conn, ctl) = DynamicMockConnector::new_with_controller("dyn");
    let app = Btcm7::builder().with_connector(conn).build().unwrap();
    let err = app
        .refresh_range(d(2024, 6, 30), d(2024, 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, Btcm7Error::InvalidArg(_)));
    assert_eq!(ctl.total_calls().await, 0);
}

#[tokio::test]
async fn client_fetch_validates_range() {
    let app = mock_builder().build().unwrap();
    let btc = app.tickers().benchmark().clone();
    assert!(matches!(
        app.client().fetch(&btc, d(2024, 3, 2), d(2024, 3, 1)).await,
        Err(Btcm7Error::InvalidArg(_))
    ));
    let s = app.client().fetch(&btc, d(2024, 3, 1), d(2024, 3, 31)).await.unwrap();
    assert_eq!(s.len(), 31);
}

#[tokio::test]
async fn one_failed_ticker_fails_the_refresh() {
    let app = mock_builder()
        .tickers(set_with(&["AAPL", "UNKNOWN"]))
        .build()
        .unwrap();
    let (start, end) = h1_2024();
    let err = app.refresh_range(start, end).await.unwrap_err();
    match err {
        Btcm7Error::Ticker { symbol, error } => {
            assert_eq!(symbol, "UNKNOWN");
            assert_eq!(*error, Btcm7Error::unknown_ticker("UNKNOWN"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn several_failures_are_aggregated() {
    let app = mock_builder()
        .tickers(set_with(&["AAPL", "UNKNOWN", "FAIL"]))
        .build()
        .unwrap();
    let (start, end) = h1_2024();
    let err = app.refresh_range(start, end).await.unwrap_err();
    match err {
        Btcm7Error::RefreshFailed(list) => {
            let symbols: Vec<_> = list
                .iter()
                .filter_map(|e| match e {
                    Btcm7Error::Ticker { symbol, .. } => Some(symbol.as_str()),
                    _ => None,
                })
                .collect();
            assert_eq!(symbols, ["UNKNOWN", "FAIL"]);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn empty_series_is_a_data_error() {
    let app = mock_builder()
        .tickers(set_with(&["AAPL", "EMPTY"]))
        .build()
        .unwrap();
    let (start, end) = h1_2024();
    let err = app.refresh_range(start, end).await.unwrap_err();
    assert!(matches!(
        err,
        Btcm7Error::Ticker { ref symbol, ref error }
            if symbol == "EMPTY" && matches!(**error, Btcm7Error::Data(_))
    ));
}

#[tokio::test]
async fn short_range_reports_insufficient_history() {
    let app = mock_builder().build().unwrap();
    let err = app
        .refresh_range(d(2024, 3, 1), d(2024, 3, 31))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Btcm7Error::InsufficientHistory {
            required: 90,
            available: 31
        }
    );
    assert_eq!(app.required_rows(), 90);
}

#[tokio::test(start_paused = true)]
async fn request_timeout_bounds_the_fan_out() {
    let (conn, ctl) = DynamicMockConnector::new_with_controller("dyn");
    ctl.set_behavior("NVDA", MockBehavior::Hang).await;
    let app = Btcm7::builder()
        .with_connector(conn)
        .request_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let (start, end) = h1_2024();
    let err = app.refresh_range(start, end).await.unwrap_err();
    assert_eq!(err, Btcm7Error::request_timeout("refresh"));
}

#[tokio::test(start_paused = true)]
async fn provider_timeout_is_attributed_to_the_ticker() {
    let (conn, ctl) = DynamicMockConnector::new_with_controller("dyn");
    ctl.set_behavior("META", MockBehavior::Hang).await;
    let app = Btcm7::builder()
        .with_connector(conn)
        .provider_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let (start, end) = h1_2024();
    let err = app.refresh_range(start, end).await.unwrap_err();
    assert!(matches!(
        err,
        Btcm7Error::Ticker { ref symbol, ref error }
            if symbol == "META" && matches!(**error, Btcm7Error::ProviderUnavailable { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn rate_limited_ticker_recovers_through_the_standard_stack() {
    let (raw, ctl) = DynamicMockConnector::new_with_controller("dyn");
    ctl.script(
        "AAPL",
        vec![
            MockBehavior::Fail(Btcm7Error::rate_limited("dyn", None)),
            MockBehavior::Fail(Btcm7Error::rate_limited("dyn", None)),
        ],
    )
    .await;
    let quota = QuotaConfig {
        limit: 100,
        ..QuotaConfig::default()
    };
    let stack = ConnectorBuilder::standard(
        raw,
        &CacheConfig::default(),
        &RetryConfig::default(),
        &quota,
    )
    .build();
    let app = Btcm7::builder().with_connector(stack).build().unwrap();
    let (start, end) = h1_2024();

    let snap = app.refresh_range(start, end).await.unwrap();
    assert_eq!(snap.len(), 182);
    assert_eq!(ctl.call_count("AAPL").await, 3);
    assert_eq!(ctl.call_count("MSFT").await, 1);

    // Second refresh of the same range is served from the cache.
    app.refresh_range(start, end).await.unwrap();
    assert_eq!(ctl.total_calls().await, 10);
}

#[tokio::test]
async fn custom_weights_flow_into_the_basket() {
    let weights: BTreeMap<String, f64> =
        [("AAPL".to_string(), 1.0), ("MSFT".to_string(), 0.0)].into();
    let app = mock_builder()
        .tickers(set_with(&["AAPL", "MSFT"]))
        .basket_weights(BasketWeights::Custom(weights))
        .build()
        .unwrap();
    let (start, end) = h1_2024();
    let snap: Snapshot = app.refresh_range(start, end).await.unwrap();
    let aapl = snap.table.column("AAPL").unwrap();
    for (i, row) in snap.rows().enumerate() {
        assert!((row.basket - aapl[i]).abs() < 1e-9);
    }
}

#[test]
fn builder_rejects_invalid_setups() {
    assert!(matches!(
        Btcm7::builder().build(),
        Err(Btcm7Error::InvalidArg(_))
    ));
    assert!(matches!(
        mock_builder().max_concurrency(0).build(),
        Err(Btcm7Error::InvalidConfig(_))
    ));
    assert!(matches!(
        mock_builder().zscore_lookback(0).build(),
        Err(Btcm7Error::InvalidConfig(_))
    ));
    let stray: BTreeMap<String, f64> = [("BTC/USD".to_string(), 1.0)].into();
    assert!(matches!(
        mock_builder()
            .tickers(set_with(&["AAPL"]))
            .basket_weights(BasketWeights::Custom(stray))
            .build(),
        Err(Btcm7Error::InvalidConfig(_))
    ));
    let partial: BTreeMap<String, f64> = [("AAPL".to_string(), 1.0)].into();
    assert!(matches!(
        mock_builder()
            .tickers(set_with(&["AAPL", "MSFT"]))
            .basket_weights(BasketWeights::Custom(partial))
            .build(),
        Err(Btcm7Error::InvalidConfig(_))
    ));
}

#[tokio::test]
async fn snapshot_serializes_for_presenters() {
    let app = mock_builder().build().unwrap();
    let (start, end) = h1_2024();
    let snap = app.refresh_range(start, end).await.unwrap();
    let json = snap.to_json().unwrap();
    let back: Snapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.latest().day, end);
    assert_eq!(back.signal(), snap.signal());
    assert!(matches!(
        snap.signal(),
        Signal::StrongBtc
            | Signal::ModerateBtc
            | Signal::Neutral
            | Signal::ModerateBasket
            | Signal::StrongBasket
    ));
}
