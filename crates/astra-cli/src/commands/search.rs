// crates/astra-cli/src/commands/search.rs
//
// `astra search <query>`: look up residents by name.

use clap::Args;

use astra_ledger::{ElementKey, SearchOutcome};

use crate::app::App;

/// Resident search command.
#[derive(Debug, Args)]
pub struct SearchCmd {
    /// Part of a display name (at least two characters).
    #[arg()]
    pub query: String,
}

/// Run the search command.
pub async fn run(app: &App, cmd: &SearchCmd) -> Result<(), Box<dyn std::error::Error>> {
    match app.resolver.input(&cmd.query).await {
        SearchOutcome::Suggestions(_) => {
            app.surface.print(ElementKey::RecipientSuggestions, app.format)
        }
        SearchOutcome::Hidden | SearchOutcome::Superseded => {
            println!("No residents match {:?}.", cmd.query.trim())
        }
    }
    Ok(())
}
