// crates/astra-cli/src/commands/history.rs
//
// `astra history [--limit N]`: most recent transactions, newest first.

use astra_ledger::ElementKey;
use clap::Args;

use crate::app::App;

/// Transaction history command.
#[derive(Debug, Args)]
pub struct HistoryCmd {
    /// Number of transactions to show (default: from config, 20).
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Run the history command.
pub async fn run(app: &App, cmd: &HistoryCmd) -> Result<(), Box<dyn std::error::Error>> {
    let limit = cmd.limit.unwrap_or(app.client.config().history_limit);
    app.client.load_transactions_limit(limit).await;
    app.surface.print(ElementKey::TransactionList, app.format);
    Ok(())
}
