use std::time::Duration;

use btcm7_core::connector::{Btcm7Connector, SeriesProvider};
use btcm7_core::{AssetClass, Btcm7Error, SeriesRequest, Ticker};
use btcm7_twelvedata::TwelveDataConnector;
use chrono::NaiveDate;
use httpmock::prelude::*;
use secrecy::SecretString;
use serde_json::json;

fn connector(server: &MockServer) -> TwelveDataConnector {
    TwelveDataConnector::with_base_url(
        SecretString::from("test-key".to_string()),
        &server.base_url(),
        Duration::from_secs(5),
    )
    .expect("valid connector")
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn march_1_to_5() -> SeriesRequest {
    SeriesRequest::daily(d(1), d(5)).unwrap()
}

#[tokio::test]
async fn parses_values_and_sends_expected_query() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/time_series")
                .query_param("symbol", "BTC/USD")
                .query_param("interval", "1day")
                .query_param("start_date", "2024-03-01")
                .query_param("end_date", "2024-03-05")
                .query_param("order", "ASC")
                .query_param("apikey", "test-key");
            then.status(200).json_body(json!({
                "meta": { "symbol": "BTC/USD", "interval": "1day" },
                "values": [
                    { "datetime": "2024-03-02", "open": "1", "high": "1", "low": "1", "close": "62000.5" },
                    { "datetime": "2024-03-01", "open": "1", "high": "1", "low": "1", "close": "61000.25" }
                ],
                "status": "ok"
            }));
        })
        .await;

    let td = connector(&server);
    let btc = Ticker::crypto("BTC/USD").unwrap();
    let series = td.series(&btc, &march_1_to_5()).await.unwrap();
    mock.assert_async().await;

    assert_eq!(series.len(), 2);
    assert_eq!(series.points()[0].day, d(1));
    assert!((series.points()[0].close - 61_000.25).abs() < 1e-9);
    assert_eq!(series.points()[1].day, d(2));
    assert_eq!(series.ticker(), &btc);
}

#[tokio::test]
async fn no_data_message_yields_empty_series() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/time_series");
            then.status(200).json_body(json!({
                "code": 400,
                "message": "No data is available on the specified dates. Try setting different start/end dates.",
                "status": "error"
            }));
        })
        .await;

    let series = connector(&server)
        .series(&Ticker::equity("AAPL").unwrap(), &march_1_to_5())
        .await
        .unwrap();
    assert!(series.is_empty());
}

#[tokio::test]
async fn http_429_carries_retry_after_hint() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/time_series");
            then.status(429)
                .header("Retry-After", "3")
                .body("Too Many Requests");
        })
        .await;

    let err = connector(&server)
        .series(&Ticker::equity("AAPL").unwrap(), &march_1_to_5())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Btcm7Error::rate_limited("btcm7-twelvedata", Some(3_000))
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn credit_exhaustion_in_body_is_rate_limited() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/time_series");
            then.status(200).json_body(json!({
                "code": 429,
                "message": "You have run out of API credits for the current minute.",
                "status": "error"
            }));
        })
        .await;

    let err = connector(&server)
        .series(&Ticker::equity("AAPL").unwrap(), &march_1_to_5())
        .await
        .unwrap_err();
    assert!(matches!(err, Btcm7Error::ProviderRateLimited { retry_after_ms: None, .. }));
}

#[tokio::test]
async fn unknown_symbol_is_not_retryable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/time_series");
            then.status(200).json_body(json!({
                "code": 400,
                "message": "**symbol** not found: ZZZZ. Please specify it correctly.",
                "status": "error"
            }));
        })
        .await;

    let err = connector(&server)
        .series(&Ticker::equity("ZZZZ").unwrap(), &march_1_to_5())
        .await
        .unwrap_err();
    assert_eq!(err, Btcm7Error::unknown_ticker("ZZZZ"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn bad_key_is_invalid_config() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/time_series");
            then.status(401).json_body(json!({
                "code": 401,
                "message": "**apikey** parameter is incorrect or not specified.",
                "status": "error"
            }));
        })
        .await;

    let err = connector(&server)
        .series(&Ticker::equity("AAPL").unwrap(), &march_1_to_5())
        .await
        .unwrap_err();
    assert!(matches!(err, Btcm7Error::InvalidConfig(_)));
    assert!(err.is_actionable());
}

#[tokio::test]
async fn server_error_and_garbage_are_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/time_series").query_param("symbol", "AAPL");
            then.status(503).body("upstream down");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/time_series").query_param("symbol", "MSFT");
            then.status(200).body("<html>not json</html>");
        })
        .await;

    let td = connector(&server);
    for sym in ["AAPL", "MSFT"] {
        let err = td
            .series(&Ticker::equity(sym).unwrap(), &march_1_to_5())
            .await
            .unwrap_err();
        assert!(
            matches!(err, Btcm7Error::ProviderUnavailable { ref connector, .. } if connector == "btcm7-twelvedata"),
            "{sym}: {err:?}"
        );
    }
}

#[tokio::test]
async fn unreachable_host_is_unavailable_and_hides_key() {
    let td = TwelveDataConnector::with_base_url(
        SecretString::from("super-secret".to_string()),
        "http://127.0.0.1:9/",
        Duration::from_millis(500),
    )
    .unwrap();
    let err = td
        .series(&Ticker::equity("AAPL").unwrap(), &march_1_to_5())
        .await
        .unwrap_err();
    assert!(matches!(err, Btcm7Error::ProviderUnavailable { .. }));
    assert!(!err.to_string().contains("super-secret"));
}

#[test]
fn empty_key_and_bad_url_are_rejected() {
    assert!(matches!(
        TwelveDataConnector::new_raw(SecretString::from("  ".to_string())),
        Err(Btcm7Error::InvalidConfig(_))
    ));
    assert!(matches!(
        TwelveDataConnector::with_base_url(
            SecretString::from("k".to_string()),
            "not a url",
            Duration::from_secs(1)
        ),
        Err(Btcm7Error::InvalidConfig(_))
    ));
}

#[test]
fn advertises_both_classes() {
    let td = TwelveDataConnector::new_raw(SecretString::from("k".to_string())).unwrap();
    assert_eq!(td.name(), "btcm7-twelvedata");
    assert_eq!(td.key(), TwelveDataConnector::KEY);
    assert!(td.supports_class(AssetClass::Crypto));
    assert!(td.supports_class(AssetClass::Equity));
    assert!(td.as_series_provider().is_some());
}

#[test]
fn rate_limited_builder_wraps_standard_stack() {
    let builder = TwelveDataConnector::rate_limited(SecretString::from("k".to_string())).unwrap();
    let names: Vec<String> = builder
        .describe()
        .iter()
        .map(|l| l["name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        names,
        [
            "CachingConnector",
            "RetryingConnector",
            "QuotaAwareConnector",
            "RawConnector"
        ]
    );
    assert_eq!(builder.build().name(), "btcm7-twelvedata");
}
