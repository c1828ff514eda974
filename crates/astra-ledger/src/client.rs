// crates/astra-ledger/src/client.rs
//
// LedgerClient: the client-side source of truth for "what is my balance
// and what happened to it".
//
// Reads never fail toward the caller. An unreachable ledger degrades to a
// placeholder balance that is flagged as unverified, and to an explicit
// empty history.

use astra_core::{AstraError, MarketStats, ResidentId, Transaction};

use crate::balance::{BalanceCell, BalanceSnapshot};
use crate::collaborators::{bounded, Collaborators};
use crate::config::LedgerConfig;
use crate::view::{ElementKey, TransactionRow, View};

#[derive(Debug, Clone)]
pub struct LedgerClient {
    collab: Collaborators,
    config: LedgerConfig,
    balance: BalanceCell,
}

impl LedgerClient {
    pub fn new(collab: Collaborators, config: LedgerConfig) -> Self {
        Self {
            collab,
            config,
            balance: BalanceCell::new(),
        }
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collab
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Read handle on the cached balance, for display and vote weight.
    pub fn balance_cell(&self) -> &BalanceCell {
        &self.balance
    }

    /// The cached balance without touching the network.
    pub fn balance(&self) -> Option<BalanceSnapshot> {
        self.balance.get()
    }

    /// Fetch the authoritative balance, cache it, and render it.
    ///
    /// Falls back to the configured placeholder (flagged unverified) on any
    /// failure or when the resident has no balance row yet.
    pub async fn load_balance(&self) -> BalanceSnapshot {
        let snapshot = match self.fetch_balance().await {
            Ok(amount) => BalanceSnapshot::verified(amount),
            Err(e) => {
                tracing::warn!("Balance load failed: {}. Showing unverified placeholder.", e);
                BalanceSnapshot::placeholder(self.config.placeholder_balance())
            }
        };

        self.balance.store(snapshot);
        self.collab.render(ElementKey::BalanceDisplay, View::Balance(snapshot));
        snapshot
    }

    async fn fetch_balance(&self) -> Result<astra_core::Astra, AstraError> {
        let resident = self.resident()?;
        let store = self
            .collab
            .store
            .as_ref()
            .ok_or_else(|| AstraError::Offline("no ledger store configured".to_string()))?;

        bounded(self.config.request_timeout(), store.balance(resident))
            .await?
            .ok_or_else(|| AstraError::NotFound(format!("balance row for resident {}", resident)))
    }

    /// Load the configured number of most recent transactions.
    pub async fn load_transactions(&self) -> Vec<Transaction> {
        self.load_transactions_limit(self.config.history_limit).await
    }

    /// Load up to `limit` recent transactions, newest first, and render
    /// them. Any failure yields (and renders) an empty list.
    pub async fn load_transactions_limit(&self, limit: usize) -> Vec<Transaction> {
        let (viewer, mut transactions) = match self.fetch_transactions(limit).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Transaction history load failed: {}", e);
                self.collab
                    .render(ElementKey::TransactionList, View::Transactions(Vec::new()));
                return Vec::new();
            }
        };

        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        transactions.truncate(limit);

        let rows = transactions
            .iter()
            .map(|tx| TransactionRow::from_transaction(tx, viewer))
            .collect();
        self.collab
            .render(ElementKey::TransactionList, View::Transactions(rows));
        transactions
    }

    async fn fetch_transactions(
        &self,
        limit: usize,
    ) -> Result<(ResidentId, Vec<Transaction>), AstraError> {
        let resident = self.resident()?;
        let store = self
            .collab
            .store
            .as_ref()
            .ok_or_else(|| AstraError::Offline("no ledger store configured".to_string()))?;
        let txs = bounded(
            self.config.request_timeout(),
            store.transactions(resident, limit),
        )
        .await?;
        Ok((resident, txs))
    }

    /// Load aggregate ledger figures. Failures are logged and yield `None`.
    pub async fn load_market_stats(&self) -> Option<MarketStats> {
        let procedures = match &self.collab.procedures {
            Some(p) => p,
            None => {
                tracing::debug!("Market stats skipped: no ledger procedures configured");
                return None;
            }
        };

        match bounded(self.config.request_timeout(), procedures.market_stats()).await {
            Ok(stats) => {
                self.collab
                    .render(ElementKey::MarketStats, View::MarketStats(stats.clone()));
                Some(stats)
            }
            Err(e) => {
                tracing::warn!("Market stats failed: {}", e);
                None
            }
        }
    }

    /// Render whether a wallet is bound, and return its address.
    pub fn show_wallet_status(&self) -> Option<String> {
        let address = self.collab.wallet_address();
        self.collab
            .render(ElementKey::WalletStatus, View::Wallet(address.clone()));
        address
    }

    /// Reload balance, then history, in that order.
    pub async fn refresh(&self) -> BalanceSnapshot {
        let snapshot = self.load_balance().await;
        self.load_transactions().await;
        snapshot
    }

    fn resident(&self) -> Result<ResidentId, AstraError> {
        self.collab
            .session()
            .resident_id
            .ok_or_else(|| AstraError::NotFound("no current resident".to_string()))
    }
}
