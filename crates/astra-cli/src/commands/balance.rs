// crates/astra-cli/src/commands/balance.rs
//
// `astra balance` and `astra stats`: the resident's balance and ledger-wide
// figures.

use astra_ledger::ElementKey;

use crate::app::App;

/// Run the balance command.
pub async fn run(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    app.client.load_balance().await;
    app.surface.print(ElementKey::BalanceDisplay, app.format);
    Ok(())
}

/// Run the stats command.
pub async fn run_stats(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    match app.client.load_market_stats().await {
        Some(_) => app.surface.print(ElementKey::MarketStats, app.format),
        None => println!("Market stats unavailable."),
    }
    Ok(())
}
