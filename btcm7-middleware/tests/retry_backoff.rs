mod common;

use std::time::Duration;

use btcm7_core::{Btcm7Error, RetryConfig};
use btcm7_middleware::ConnectorBuilder;
use btcm7_mock::{DynamicMockConnector, MockBehavior};
use common::{aapl, march};

fn retry_cfg() -> RetryConfig {
    RetryConfig {
        max_attempts: 4,
        min_backoff_ms: 1_000,
        max_backoff_ms: 30_000,
        factor: 2,
        jitter_percent: 20,
        attempt_timeout: Duration::from_secs(10),
        max_elapsed: Duration::from_secs(120),
    }
}

#[tokio::test(start_paused = true)]
async fn two_rate_limits_then_success_takes_three_attempts() {
    let (raw, controller) = DynamicMockConnector::new_with_controller("dyn");
    controller
        .script(
            "AAPL",
            vec![
                MockBehavior::Fail(Btcm7Error::rate_limited("dyn", None)),
                MockBehavior::Fail(Btcm7Error::rate_limited("dyn", None)),
                MockBehavior::Fixture,
            ],
        )
        .await;
    let wrapped = ConnectorBuilder::new(raw).with_retry(&retry_cfg()).build();

    let series = wrapped
        .as_series_provider()
        .unwrap()
        .series(&aapl(), &march())
        .await
        .unwrap();
    assert_eq!(series.ticker(), &aapl());
    assert_eq!(series.len(), 21);

    let calls = controller.calls("AAPL").await;
    assert_eq!(calls.len(), 3);
    let first_gap = calls[1] - calls[0];
    let second_gap = calls[2] - calls[1];
    assert!(first_gap >= Duration::from_millis(1_000));
    assert!(second_gap >= first_gap, "{second_gap:?} < {first_gap:?}");
    assert!(second_gap >= Duration::from_millis(2_000));
}

#[tokio::test(start_paused = true)]
async fn retry_after_hint_is_honored() {
    let (raw, controller) = DynamicMockConnector::new_with_controller("dyn");
    controller
        .script(
            "AAPL",
            vec![
                MockBehavior::Fail(Btcm7Error::rate_limited("dyn", Some(7_000))),
                MockBehavior::Fixture,
            ],
        )
        .await;
    let wrapped = ConnectorBuilder::new(raw).with_retry(&retry_cfg()).build();
    wrapped
        .as_series_provider()
        .unwrap()
        .series(&aapl(), &march())
        .await
        .unwrap();
    let calls = controller.calls("AAPL").await;
    assert!(calls[1] - calls[0] >= Duration::from_millis(7_000));
}

#[tokio::test(start_paused = true)]
async fn unknown_ticker_is_not_retried() {
    let (raw, controller) = DynamicMockConnector::new_with_controller("dyn");
    controller
        .set_behavior("AAPL", MockBehavior::Fail(Btcm7Error::unknown_ticker("AAPL")))
        .await;
    let wrapped = ConnectorBuilder::new(raw).with_retry(&retry_cfg()).build();
    let err = wrapped
        .as_series_provider()
        .unwrap()
        .series(&aapl(), &march())
        .await
        .unwrap_err();
    assert!(matches!(err, Btcm7Error::UnknownTicker { .. }));
    assert_eq!(controller.call_count("AAPL").await, 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_attempts_surface_last_error() {
    let (raw, controller) = DynamicMockConnector::new_with_controller("dyn");
    controller
        .set_behavior("AAPL", MockBehavior::Fail(Btcm7Error::unavailable("dyn", "503")))
        .await;
    let wrapped = ConnectorBuilder::new(raw).with_retry(&retry_cfg()).build();
    let err = wrapped
        .as_series_provider()
        .unwrap()
        .series(&aapl(), &march())
        .await
        .unwrap_err();
    assert!(matches!(err, Btcm7Error::ProviderUnavailable { .. }));
    assert_eq!(controller.call_count("AAPL").await, 4);
}

#[tokio::test(start_paused = true)]
async fn hung_attempt_times_out_and_is_retried() {
    let (raw, controller) = DynamicMockConnector::new_with_controller("dyn");
    controller
        .script("AAPL", vec![MockBehavior::Hang, MockBehavior::Fixture])
        .await;
    let cfg = RetryConfig {
        attempt_timeout: Duration::from_secs(2),
        ..retry_cfg()
    };
    let wrapped = ConnectorBuilder::new(raw).with_retry(&cfg).build();
    let series = wrapped
        .as_series_provider()
        .unwrap()
        .series(&aapl(), &march())
        .await
        .unwrap();
    assert!(!series.is_empty());
    assert_eq!(controller.call_count("AAPL").await, 2);
}

#[tokio::test(start_paused = true)]
async fn max_elapsed_bounds_the_sequence() {
    let (raw, controller) = DynamicMockConnector::new_with_controller("dyn");
    controller
        .set_behavior("AAPL", MockBehavior::Fail(Btcm7Error::unavailable("dyn", "503")))
        .await;
    let cfg = RetryConfig {
        max_attempts: 10,
        jitter_percent: 0,
        max_elapsed: Duration::from_secs(5),
        ..retry_cfg()
    };
    let wrapped = ConnectorBuilder::new(raw).with_retry(&cfg).build();
    let err = wrapped
        .as_series_provider()
        .unwrap()
        .series(&aapl(), &march())
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    // Delays 1s and 2s fit in 5s; the next 4s delay would not.
    assert_eq!(controller.call_count("AAPL").await, 3);
}
