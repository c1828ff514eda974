// crates/astra-ledger/src/view.rs
//
// Structured display content, keyed by stable element keys. Each key has
// exactly one writer:
//
//   BalanceDisplay, TransactionList, MarketStats,
//   WalletStatus                                 -> LedgerClient
//   RecipientSuggestions                         -> RecipientResolver
//   ProposalList                                 -> Governance

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use astra_core::{
    Astra, Direction, MarketStats, Proposal, Resident, ResidentId, Transaction, TransactionKind,
};

use crate::balance::BalanceSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementKey {
    BalanceDisplay,
    TransactionList,
    RecipientSuggestions,
    ProposalList,
    MarketStats,
    WalletStatus,
}

impl ElementKey {
    /// DOM id of the container this key maps to.
    pub fn dom_id(&self) -> &'static str {
        match self {
            ElementKey::BalanceDisplay => "astraBalanceValue",
            ElementKey::TransactionList => "astraTransactionsList",
            ElementKey::RecipientSuggestions => "astraRecipientSuggestions",
            ElementKey::ProposalList => "daoProposalsList",
            ElementKey::MarketStats => "astraMarketStats",
            ElementKey::WalletStatus => "astraWeb3Status",
        }
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dom_id())
    }
}

/// One line of the history listing, already resolved against the viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRow {
    pub kind: TransactionKind,
    pub direction: Direction,
    pub counterparty: String,
    pub amount: Astra,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRow {
    pub fn from_transaction(tx: &Transaction, viewer: ResidentId) -> Self {
        Self {
            kind: tx.kind.clone(),
            direction: tx.direction_for(viewer),
            counterparty: tx.counterparty_name(viewer).to_string(),
            amount: tx.amount,
            note: tx.note.clone().filter(|n| !n.trim().is_empty()),
            created_at: tx.created_at,
        }
    }

    /// Amount with a `+`/`-` sign for the viewer.
    pub fn signed_amount(&self) -> String {
        let sign = match self.direction {
            Direction::Incoming => '+',
            Direction::Outgoing => '-',
        };
        format!("{}{}", sign, self.amount.amount_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalRow {
    pub proposal: Proposal,
    /// Tally includes a local vote the backend has not confirmed yet.
    pub provisional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum View {
    Balance(BalanceSnapshot),
    /// An empty list is an explicit "no transactions" state.
    Transactions(Vec<TransactionRow>),
    Suggestions(Vec<Resident>),
    Proposals {
        rows: Vec<ProposalRow>,
        vote_weight: Option<Astra>,
    },
    MarketStats(MarketStats),
    /// Connected wallet address, or `None` when no wallet is bound.
    Wallet(Option<String>),
    /// Collapse the container (used for the suggestion dropdown).
    Hidden,
}

/// Where views end up. The host decides what rendering means.
pub trait DisplaySurface: Send + Sync {
    fn render(&self, key: ElementKey, view: View);
}
