// crates/astra-cli/src/main.rs
//
// CLI entrypoint for the Astra resident ledger.
//
// Provides subcommands for checking the balance and history, finding
// residents, sending, granting and contributing Astra, triggering activity
// rewards, and voting on governance proposals.

mod app;
mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use commands::claim::ClaimCmd;
use commands::history::HistoryCmd;
use commands::proposals::ProposalCmd;
use commands::reward::RewardCmd;
use commands::search::SearchCmd;
use commands::send::{ContributeCmd, GrantCmd, SendCmd};

use app::App;
use config::CliConfig;
use output::OutputFormat;

/// Astra CLI: the resident token ledger from the terminal.
#[derive(Parser, Debug)]
#[command(
    name = "astra",
    version = "0.1.0",
    about = "Astra ledger client: balance, transfers, rewards and governance"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value_t = config::default_path())]
    config: String,

    /// Use a seeded in-memory ledger instead of the configured backend.
    #[arg(long, global = true)]
    demo: bool,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Show your balance.
    Balance,

    /// Show recent transactions.
    History(HistoryCmd),

    /// Find residents by name.
    Search(SearchCmd),

    /// Send Astra to another resident.
    Send(SendCmd),

    /// Credit a resident (administrators only).
    Grant(GrantCmd),

    /// Contribute Astra to a shared project.
    Contribute(ContributeCmd),

    /// Claim Astra to your connected wallet.
    Claim(ClaimCmd),

    /// Trigger an activity reward.
    Reward(RewardCmd),

    /// Show total supply and 24h transaction count.
    Stats,

    /// Governance proposals: list, vote.
    #[command(subcommand)]
    Proposals(ProposalCmd),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, falling back to defaults if the file
    // is not found. Logging is not up yet, so the outcome is reported after.
    let loaded = CliConfig::load(&cli.config);
    let config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => CliConfig::default(),
    };

    // Initialize tracing subscriber for structured logging. RUST_LOG wins
    // over the configured level.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    match &loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", cli.config),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            cli.config,
            e
        ),
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };
    let app = App::connect(&config, cli.demo, format)?;

    match &cli.command {
        Commands::Balance => commands::balance::run(&app).await?,
        Commands::History(cmd) => commands::history::run(&app, cmd).await?,
        Commands::Search(cmd) => commands::search::run(&app, cmd).await?,
        Commands::Send(cmd) => commands::send::run(&app, cmd).await?,
        Commands::Grant(cmd) => commands::send::run_grant(&app, cmd).await?,
        Commands::Contribute(cmd) => commands::send::run_contribute(&app, cmd).await?,
        Commands::Claim(cmd) => commands::claim::run(&app, cmd).await?,
        Commands::Reward(cmd) => commands::reward::run(&app, cmd).await?,
        Commands::Stats => commands::balance::run_stats(&app).await?,
        Commands::Proposals(cmd) => commands::proposals::run(&app, cmd).await?,
    }

    Ok(())
}
