// crates/astra-cli/src/commands/proposals.rs
//
// `astra proposals {list, vote}`: governance proposals and balance-weighted
// voting.

use clap::Subcommand;

use astra_ledger::ElementKey;

use crate::app::App;

/// Governance subcommands.
#[derive(Debug, Subcommand)]
pub enum ProposalCmd {
    /// List proposals with their current tallies.
    List,
    /// Vote on a proposal with your whole verified balance.
    Vote {
        /// Proposal id.
        #[arg()]
        id: String,
        /// Vote against instead of in favour.
        #[arg(long)]
        against: bool,
    },
}

/// Run the proposals subcommand.
pub async fn run(app: &App, cmd: &ProposalCmd) -> Result<(), Box<dyn std::error::Error>> {
    app.client.load_balance().await;
    app.governance.load_proposals().await;

    match cmd {
        ProposalCmd::List => {}
        ProposalCmd::Vote { id, against } => {
            app.governance.vote(id, !against).await?;
        }
    }
    app.surface.print(ElementKey::ProposalList, app.format);
    Ok(())
}
