// crates/astra-cli/src/commands/claim.rs
//
// `astra claim [--amount X] [--status]`: move off-chain Astra to the wallet
// named in the config file.

use clap::Args;

use astra_ledger::ElementKey;

use crate::app::App;

/// Claim Astra to the connected wallet.
#[derive(Debug, Args)]
pub struct ClaimCmd {
    /// Amount in ASTR (default: the whole verified balance).
    #[arg(long)]
    pub amount: Option<String>,

    /// Only show the wallet binding and balance.
    #[arg(long)]
    pub status: bool,
}

/// Run the claim command.
pub async fn run(app: &App, cmd: &ClaimCmd) -> Result<(), Box<dyn std::error::Error>> {
    app.client.load_balance().await;

    if cmd.status {
        app.client.show_wallet_status();
    } else {
        app.transfers.claim_to_wallet(cmd.amount.as_deref()).await?;
    }
    app.surface.print(ElementKey::WalletStatus, app.format);
    app.surface.print(ElementKey::BalanceDisplay, app.format);
    Ok(())
}
