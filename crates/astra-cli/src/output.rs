// crates/astra-cli/src/output.rs
//
// Output formatting utilities for the astra CLI.
// Supports table and JSON output modes.
//
// The ledger client renders into `TerminalSurface`, which keeps the latest
// view per element key; commands print the keys they care about once the
// operation has finished. Notices go to stderr so stdout stays parseable.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;
use tabled::{Table, Tabled};

use astra_core::{NotificationSink, Severity};
use astra_ledger::{BalanceSnapshot, DisplaySurface, ElementKey, View};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TerminalSurface {
    views: RwLock<HashMap<ElementKey, View>>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self, key: ElementKey) -> Option<View> {
        match self.views.read() {
            Ok(guard) => guard.get(&key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(&key).cloned(),
        }
    }

    /// Print the latest view for `key`, if anything was rendered there.
    pub fn print(&self, key: ElementKey, format: OutputFormat) {
        if let Some(view) = self.view(key) {
            println!("{}", format_view(&view, format));
        }
    }
}

impl DisplaySurface for TerminalSurface {
    fn render(&self, key: ElementKey, view: View) {
        match self.views.write() {
            Ok(mut guard) => {
                guard.insert(key, view);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key, view);
            }
        }
    }
}

/// Notices on stderr, one line each.
#[derive(Debug, Default)]
pub struct StderrNotifier;

impl NotificationSink for StderrNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        let tag = match severity {
            Severity::Success => "ok",
            Severity::Error => "error",
            Severity::Info => "info",
        };
        eprintln!("[{}] {}", tag, message);
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct TransactionLine {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Counterparty")]
    counterparty: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Note")]
    note: String,
}

#[derive(Tabled)]
struct ResidentLine {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct ProposalLine {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "For")]
    votes_for: String,
    #[tabled(rename = "Against")]
    votes_against: String,
    #[tabled(rename = "Yes %")]
    percent_for: u8,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Ends")]
    ends: String,
}

pub fn format_view(view: &View, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return format_json(view);
    }
    match view {
        View::Balance(snapshot) => format_balance(snapshot),
        View::Transactions(rows) if rows.is_empty() => "No transactions yet.".to_string(),
        View::Transactions(rows) => {
            let lines: Vec<TransactionLine> = rows
                .iter()
                .map(|r| TransactionLine {
                    when: r.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    kind: r.kind.label().to_string(),
                    counterparty: r.counterparty.clone(),
                    amount: r.signed_amount(),
                    note: r.note.clone().unwrap_or_default(),
                })
                .collect();
            format_table(&lines)
        }
        View::Suggestions(residents) => {
            let lines: Vec<ResidentLine> = residents
                .iter()
                .map(|r| ResidentLine {
                    name: r.display_name.clone(),
                    role: r.role.clone().unwrap_or_else(|| "--".to_string()),
                    id: r.id.to_string(),
                })
                .collect();
            format_table(&lines)
        }
        View::Proposals { rows, vote_weight } => {
            let lines: Vec<ProposalLine> = rows
                .iter()
                .map(|r| ProposalLine {
                    id: r.proposal.id.clone(),
                    title: r.proposal.title.clone(),
                    votes_for: r.proposal.votes_for.amount_string(),
                    votes_against: r.proposal.votes_against.amount_string(),
                    percent_for: r.proposal.percent_for(),
                    status: if r.provisional {
                        "pending vote".to_string()
                    } else {
                        format!("{:?}", r.proposal.status).to_lowercase()
                    },
                    ends: r.proposal.ends_at.format("%Y-%m-%d").to_string(),
                })
                .collect();
            let weight = match vote_weight {
                Some(w) => format!("Voting power: {}", w),
                None => "Voting power: unknown (balance not verified)".to_string(),
            };
            if lines.is_empty() {
                format!("No proposals.\n{}", weight)
            } else {
                format!("{}\n{}", format_table(&lines), weight)
            }
        }
        View::MarketStats(stats) => format!(
            "Total supply:      {}\nTransactions 24h:  {}",
            stats.total_supply, stats.tx_count_24h
        ),
        View::Wallet(Some(address)) => format!("Wallet: {} (connected)", address),
        View::Wallet(None) => {
            "Wallet: not connected. Set wallet_address in the config file to enable claims."
                .to_string()
        }
        View::Hidden => String::new(),
    }
}

fn format_balance(snapshot: &BalanceSnapshot) -> String {
    if snapshot.is_verified() {
        format!("Balance: {}", snapshot.amount)
    } else {
        format!("Balance: {} (unverified, ledger unreachable)", snapshot.amount)
    }
}
