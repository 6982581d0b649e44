//! Twelve Data `/time_series` payloads and their mapping onto btcm7 types.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use btcm7_core::{Btcm7Error, PricePoint, RawSeries, Ticker};

use crate::CONNECTOR_NAME;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Payload {
    Error(ErrorBody),
    Series(SeriesBody),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SeriesBody {
    pub values: Vec<Bar>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Bar {
    pub datetime: String,
    pub close: String,
}

fn looks_like_unknown_symbol(msg: &str) -> bool {
    let m = msg.to_ascii_lowercase();
    m.contains("symbol") || m.contains("not found")
}

fn looks_like_empty_range(msg: &str) -> bool {
    msg.to_ascii_lowercase().contains("no data is available")
}

/// Outcome of classifying a provider error code.
pub(crate) enum ErrorOutcome {
    Fail(Btcm7Error),
    Empty,
}

/// Map a provider status code and message onto the btcm7 taxonomy.
pub(crate) fn classify_error(
    code: u16,
    message: &str,
    ticker: &Ticker,
    retry_after_ms: Option<u64>,
) -> ErrorOutcome {
    let err = match code {
        429 => Btcm7Error::rate_limited(CONNECTOR_NAME, retry_after_ms),
        401 | 403 => Btcm7Error::InvalidConfig(format!("twelve data rejected credentials: {message}")),
        400 | 404 if looks_like_empty_range(message) => return ErrorOutcome::Empty,
        400 | 404 if looks_like_unknown_symbol(message) => {
            Btcm7Error::unknown_ticker(ticker.symbol())
        }
        400..=499 => Btcm7Error::InvalidArg(format!("twelve data rejected request ({code}): {message}")),
        _ => Btcm7Error::unavailable(CONNECTOR_NAME, format!("status {code}: {message}")),
    };
    ErrorOutcome::Fail(err)
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Convert decoded bars into a validated series.
///
/// # Errors
/// Unparsable dates or prices, and any series invariant violation, become
/// `ProviderUnavailable`: the payload is not usable as delivered.
pub(crate) fn into_series(ticker: &Ticker, bars: Vec<Bar>) -> Result<RawSeries, Btcm7Error> {
    let points = bars
        .into_iter()
        .map(|b| {
            let day = parse_day(&b.datetime).ok_or_else(|| {
                Btcm7Error::unavailable(CONNECTOR_NAME, format!("bad datetime '{}'", b.datetime))
            })?;
            let close: f64 = b.close.trim().parse().map_err(|_| {
                Btcm7Error::unavailable(CONNECTOR_NAME, format!("bad close '{}'", b.close))
            })?;
            Ok(PricePoint::new(day, close))
        })
        .collect::<Result<Vec<_>, Btcm7Error>>()?;
    RawSeries::new(ticker.clone(), points).map_err(|e| match e {
        Btcm7Error::Data(msg) => Btcm7Error::unavailable(CONNECTOR_NAME, msg),
        other => other,
    })
}

/// Decode a response body received with `http_status`.
///
/// # Errors
/// See [`classify_error`] and [`into_series`]; undecodable JSON becomes
/// `ProviderUnavailable` unless the HTTP status already names a failure class.
pub(crate) fn decode(
    ticker: &Ticker,
    http_status: u16,
    body: &str,
    retry_after_ms: Option<u64>,
) -> Result<RawSeries, Btcm7Error> {
    let payload = serde_json::from_str::<Payload>(body);
    let (code, message) = match payload {
        Ok(Payload::Series(s)) if (200..300).contains(&http_status) => {
            if s.status.as_deref().is_some_and(|st| st != "ok") {
                return Err(Btcm7Error::unavailable(
                    CONNECTOR_NAME,
                    format!("unexpected status '{}'", s.status.unwrap_or_default()),
                ));
            }
            return into_series(ticker, s.values);
        }
        Ok(Payload::Error(e)) => (e.code, e.message),
        Ok(Payload::Series(_)) => (http_status, String::from("unexpected body")),
        Err(err) if (200..300).contains(&http_status) => {
            return Err(Btcm7Error::unavailable(
                CONNECTOR_NAME,
                format!("malformed payload: {err}"),
            ));
        }
        Err(_) => (http_status, body.chars().take(200).collect()),
    };
    match classify_error(code, &message, ticker, retry_after_ms) {
        ErrorOutcome::Fail(e) => Err(e),
        ErrorOutcome::Empty => RawSeries::new(ticker.clone(), Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aapl() -> Ticker {
        Ticker::equity("AAPL").unwrap()
    }

    #[test]
    fn parses_date_and_datetime() {
        assert_eq!(parse_day("2024-03-01"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(
            parse_day("2024-03-01 00:00:00"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_day("03/01/2024"), None);
    }

    #[test]
    fn error_codes_map_to_taxonomy() {
        let t = aapl();
        let fail = |code, msg| match classify_error(code, msg, &t, None) {
            ErrorOutcome::Fail(e) => Some(e),
            ErrorOutcome::Empty => None,
        };
        assert!(matches!(fail(429, "run out of API credits"), Some(Btcm7Error::ProviderRateLimited { .. })));
        assert!(matches!(fail(401, "invalid apikey"), Some(Btcm7Error::InvalidConfig(_))));
        assert!(matches!(
            fail(400, "**symbol** not found: ZZZZ"),
            Some(Btcm7Error::UnknownTicker { .. })
        ));
        assert!(fail(400, "No data is available on the specified dates").is_none());
        assert!(matches!(fail(500, "oops"), Some(Btcm7Error::ProviderUnavailable { .. })));
    }

    #[test]
    fn nonpositive_close_is_unavailable() {
        let bars = vec![Bar {
            datetime: "2024-03-01".into(),
            close: "0".into(),
        }];
        assert!(matches!(
            into_series(&aapl(), bars),
            Err(Btcm7Error::ProviderUnavailable { .. })
        ));
    }
}
