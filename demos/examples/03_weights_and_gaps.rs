use btcm7::{BasketWeights, Btcm7, Btcm7Settings, GapPolicy};
use btcm7_demos::common::get_connector;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Btcm7Settings::from_env()?;
    let connector = get_connector(&mut settings)?;
    let tickers = settings.ticker_set()?;

    let variants = [
        ("equal / forward fill", BasketWeights::Equal, GapPolicy::default()),
        (
            "market cap / forward fill",
            BasketWeights::market_cap_default(),
            GapPolicy::default(),
        ),
        ("equal / intersection", BasketWeights::Equal, GapPolicy::Intersection),
    ];

    // The connector stack is shared; the second and third runs hit its cache.
    for (label, weights, policy) in variants {
        let app = Btcm7::builder()
            .with_connector(connector.clone())
            .tickers(tickers.clone())
            .config(settings.btcm7_config())
            .basket_weights(weights)
            .gap_policy(policy)
            .build()?;
        let snap = app.refresh().await?;
        println!(
            "{label:<28} days {:>4}  filled {:>4}  ratio {:>10.2}  signal {}",
            snap.len(),
            snap.table.filled_cells(),
            snap.latest().ratio,
            snap.signal()
        );
    }
    Ok(())
}
