// crates/astra-cli/src/commands/send.rs
//
// `astra send`, `astra grant`, `astra contribute`: the mutating ledger
// commands. Each loads the verified balance first, since nothing is sent
// against an unverified one.

use clap::Args;

use astra_core::Resident;
use astra_ledger::ElementKey;

use crate::app::App;

/// Send Astra to another resident.
#[derive(Debug, Args)]
pub struct SendCmd {
    /// Recipient display name (full name, or any unique part of it).
    #[arg(long)]
    pub to: String,

    /// Amount in ASTR, up to six decimal places.
    #[arg(long)]
    pub amount: String,

    /// Optional note shown in both histories.
    #[arg(long, default_value = "")]
    pub note: String,
}

/// Credit a resident (administrators only).
#[derive(Debug, Args)]
pub struct GrantCmd {
    /// Recipient display name; the first match is credited.
    #[arg(long)]
    pub to: String,

    #[arg(long)]
    pub amount: String,
}

/// Contribute Astra to a shared project.
#[derive(Debug, Args)]
pub struct ContributeCmd {
    /// Shared project id.
    #[arg(long)]
    pub project: String,

    #[arg(long)]
    pub amount: String,
}

/// Run the send command.
pub async fn run(app: &App, cmd: &SendCmd) -> Result<(), Box<dyn std::error::Error>> {
    app.client.load_balance().await;

    let recipient = pick_recipient(app, &cmd.to).await?;
    app.resolver.select(&recipient);
    app.transfers.set_amount(&cmd.amount);
    app.transfers.set_note(&cmd.note);

    app.transfers.submit_form().await?;
    print_after(app);
    Ok(())
}

/// Run the grant command.
pub async fn run_grant(app: &App, cmd: &GrantCmd) -> Result<(), Box<dyn std::error::Error>> {
    app.transfers.admin_grant(&cmd.to, &cmd.amount).await?;
    print_after(app);
    Ok(())
}

/// Run the contribute command.
pub async fn run_contribute(app: &App, cmd: &ContributeCmd) -> Result<(), Box<dyn std::error::Error>> {
    app.client.load_balance().await;
    app.transfers.contribute(&cmd.project, &cmd.amount).await?;
    print_after(app);
    Ok(())
}

fn print_after(app: &App) {
    app.surface.print(ElementKey::BalanceDisplay, app.format);
    app.surface.print(ElementKey::TransactionList, app.format);
}

/// Type the name into the resolver and pick from its suggestions. An exact
/// (case-insensitive) name match wins; otherwise the query must match
/// exactly one resident.
async fn pick_recipient(app: &App, name: &str) -> Result<Resident, Box<dyn std::error::Error>> {
    let name = name.trim();
    app.resolver.input(name).await;
    let found = app.resolver.suggestions();

    if let Some(exact) = found.iter().find(|r| r.display_name.eq_ignore_ascii_case(name)) {
        return Ok(exact.clone());
    }
    match found.as_slice() {
        [] => Err(format!("No resident matches {:?}", name).into()),
        [only] => Ok(only.clone()),
        many => {
            let names: Vec<&str> = many.iter().map(|r| r.display_name.as_str()).collect();
            Err(format!("{:?} matches several residents: {}", name, names.join(", ")).into())
        }
    }
}
