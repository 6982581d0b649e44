use btcm7::{Btcm7, Btcm7Settings};
use btcm7_demos::common::get_connector;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=info,btcm7=debug,btcm7_middleware=debug (build with --features tracing)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .try_init();

    let mut settings = Btcm7Settings::from_env()?;
    let connector = get_connector(&mut settings)?;
    let app = Btcm7::builder()
        .with_connector(connector)
        .tickers(settings.ticker_set()?)
        .config(settings.btcm7_config())
        .build()?;

    let snapshot = app.refresh().await?;
    tracing::info!(rows = snapshot.len(), signal = %snapshot.signal(), "refreshed");
    Ok(())
}
