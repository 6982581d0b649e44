use btcm7::{Btcm7, Btcm7Settings, Monitor};
use btcm7_demos::common::get_connector;
use chrono::{Days, Utc};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Btcm7Settings::from_env()?;
    let connector = get_connector(&mut settings)?;
    let app = Btcm7::builder()
        .with_connector(connector)
        .tickers(settings.ticker_set()?)
        .config(settings.btcm7_config())
        .history_capacity(3)
        .build()?;
    let monitor = Monitor::new(app);

    // Replay the last five days as if the monitor had refreshed once per day.
    let today = Utc::now().date_naive();
    for back in (0..5u64).rev() {
        let end = today - Days::new(back);
        let start = monitor.app().fetch_start(end);
        match monitor.refresh_range(start, end).await {
            Ok(s) => println!("{end}: ratio {:.2} signal {}", s.latest().ratio, s.signal()),
            Err(e) => println!("{end}: refresh failed: {e}"),
        }
    }

    if let Some(current) = monitor.current() {
        println!("current snapshot ends {}", current.end);
    }
    let ends: Vec<String> = monitor
        .history()
        .iter()
        .map(|s| s.end.to_string())
        .collect();
    println!("history (newest first): {}", ends.join(", "));
    if let Some(failure) = monitor.last_error() {
        println!("last error at {}: {}", failure.at, failure.error);
    }
    Ok(())
}
