// crates/astra-cli/src/commands/reward.rs
//
// `astra reward <kind>`: trigger an activity reward by hand, the way the
// feed does after a post or an upvote.

use clap::Args;

use astra_core::Astra;
use astra_ledger::{ActivityKind, ElementKey};

use crate::app::App;

/// Activity reward command.
#[derive(Debug, Args)]
pub struct RewardCmd {
    /// `post`, `upvote`, or any other activity kind.
    #[arg()]
    pub kind: String,

    /// Amount in ASTR. Required for kinds other than post and upvote.
    #[arg(long)]
    pub amount: Option<String>,

    /// Post id for upvotes.
    #[arg(long, default_value = "")]
    pub target: String,
}

/// Run the reward command.
pub async fn run(app: &App, cmd: &RewardCmd) -> Result<(), Box<dyn std::error::Error>> {
    let credited = match cmd.kind.as_str() {
        "post" => app.rewards.on_post_published().await?,
        "upvote" => app.rewards.on_upvote(&cmd.target).await?,
        other => {
            let amount = cmd
                .amount
                .as_deref()
                .ok_or("--amount is required for custom reward kinds")?;
            let amount = Astra::parse(amount)?;
            app.rewards
                .reward_activity(ActivityKind::from(other), amount, serde_json::json!({}))
                .await
        }
    };

    if credited {
        app.surface.print(ElementKey::BalanceDisplay, app.format);
    } else {
        println!("No reward was credited.");
    }
    Ok(())
}
