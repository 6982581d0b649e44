use btcm7::{Btcm7, Btcm7Settings};
use btcm7_demos::common::{fmt_opt, get_connector};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Btcm7Settings::from_env()?;
    let connector = get_connector(&mut settings)?;
    let app = Btcm7::builder()
        .with_connector(connector)
        .tickers(settings.ticker_set()?)
        .config(settings.btcm7_config())
        .build()?;

    let snap = app.refresh().await?;
    let latest = snap.latest();

    println!("BTC vs M7 as of {} ({} aligned days)", latest.day, snap.len());
    println!("  BTC close      {:>12.2}", latest.btc);
    println!("  M7 basket      {:>12.2}", latest.basket);
    println!("  ratio index    {:>12.2}", latest.ratio);
    for (w, m) in &latest.momentum {
        println!("  momentum {w:>3}d  {:>12}", fmt_opt(*m));
    }
    println!("  z-score        {:>12}", fmt_opt(latest.zscore));
    println!("  signal         {:>12}", snap.signal());
    println!(
        "  period change  BTC {:+.2}%  M7 {:+.2}%",
        latest.btc_change_pct, latest.basket_change_pct
    );

    println!("Constituents:");
    for c in &snap.indicators.constituents {
        println!("  {:<6} weight {:.3}  change {:+.2}%", c.symbol, c.weight, c.change_pct);
    }

    println!("Last five days:");
    let n = snap.len();
    for row in snap.rows().skip(n.saturating_sub(5)) {
        println!(
            "  {}  ratio {:>10.2}  z {:>6}",
            row.day,
            row.ratio,
            fmt_opt(row.zscore)
        );
    }
    Ok(())
}
