use std::sync::Arc;

use btcm7::{Btcm7Connector, Btcm7Error, Btcm7Settings, ConnectorBuilder};
use btcm7_twelvedata::TwelveDataConnector;

/// Return a connector stack for demos.
///
/// With `BTCM7_DEMOS_USE_MOCK` set, the deterministic mock is used and no
/// network access happens. Otherwise the Twelve Data connector is wrapped in
/// the standard cache/retry/quota stack configured from `settings`.
///
/// # Errors
/// Returns `InvalidConfig` when the real connector is requested without
/// `TWELVE_DATA_API_KEY`.
pub fn get_connector(settings: &mut Btcm7Settings) -> Result<Arc<dyn Btcm7Connector>, Btcm7Error> {
    if std::env::var("BTCM7_DEMOS_USE_MOCK").is_ok() {
        println!("--- (Using Mock Connector for CI) ---");
        return Ok(Arc::new(btcm7_mock::MockConnector::new()));
    }
    let raw: Arc<dyn Btcm7Connector> =
        Arc::new(TwelveDataConnector::new_raw(settings.take_api_key()?)?);
    Ok(ConnectorBuilder::standard(
        raw,
        &settings.cache_config(),
        &settings.retry_config(),
        &settings.quota_config(),
    )
    .build())
}

/// Format an optional value with two decimals.
#[must_use]
pub fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |x| format!("{x:.2}"))
}
