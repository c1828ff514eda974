// crates/astra-ledger/src/collaborators.rs
//
// Collaborators: the external services the ledger client talks to, injected
// once at construction. Every backend-facing collaborator is optional; an
// absent one puts the dependent operations into degraded mode.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use astra_core::{
    ActivityLog, AstraError, LedgerProcedures, LedgerStore, NotificationSink, ProposalStore,
    ResidentDirectory, Session, SessionProvider, Severity, WalletProvider,
};

use crate::view::{DisplaySurface, ElementKey, View};

#[derive(Clone)]
pub struct Collaborators {
    pub session: Arc<dyn SessionProvider>,
    pub store: Option<Arc<dyn LedgerStore>>,
    pub procedures: Option<Arc<dyn LedgerProcedures>>,
    pub directory: Option<Arc<dyn ResidentDirectory>>,
    pub proposals: Option<Arc<dyn ProposalStore>>,
    pub notifier: Option<Arc<dyn NotificationSink>>,
    pub activity_log: Option<Arc<dyn ActivityLog>>,
    pub surface: Option<Arc<dyn DisplaySurface>>,
    pub wallet: Option<Arc<dyn WalletProvider>>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("session", &self.session.session())
            .field("store", &self.store.is_some())
            .field("procedures", &self.procedures.is_some())
            .field("directory", &self.directory.is_some())
            .field("proposals", &self.proposals.is_some())
            .field("notifier", &self.notifier.is_some())
            .field("activity_log", &self.activity_log.is_some())
            .field("surface", &self.surface.is_some())
            .field("wallet", &self.wallet.is_some())
            .finish()
    }
}

impl Collaborators {
    /// Start with only a session; everything else is absent.
    pub fn new(session: Arc<dyn SessionProvider>) -> Self {
        Self {
            session,
            store: None,
            procedures: None,
            directory: None,
            proposals: None,
            notifier: None,
            activity_log: None,
            surface: None,
            wallet: None,
        }
    }

    /// Use one object for every backend-facing role.
    pub fn with_backend<B>(self, backend: Arc<B>) -> Self
    where
        B: LedgerStore + LedgerProcedures + ResidentDirectory + ProposalStore + ActivityLog + 'static,
    {
        self.with_store(backend.clone())
            .with_procedures(backend.clone())
            .with_directory(backend.clone())
            .with_proposals(backend.clone())
            .with_activity_log(backend)
    }

    pub fn with_store(mut self, store: Arc<dyn LedgerStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_procedures(mut self, procedures: Arc<dyn LedgerProcedures>) -> Self {
        self.procedures = Some(procedures);
        self
    }

    pub fn with_directory(mut self, directory: Arc<dyn ResidentDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn with_proposals(mut self, proposals: Arc<dyn ProposalStore>) -> Self {
        self.proposals = Some(proposals);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_activity_log(mut self, log: Arc<dyn ActivityLog>) -> Self {
        self.activity_log = Some(log);
        self
    }

    pub fn with_surface(mut self, surface: Arc<dyn DisplaySurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn WalletProvider>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn session(&self) -> Session {
        self.session.session()
    }

    /// Connected wallet address; blank addresses count as unbound.
    pub fn wallet_address(&self) -> Option<String> {
        self.wallet
            .as_ref()
            .and_then(|w| w.wallet_address())
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
    }

    pub(crate) fn notify(&self, severity: Severity, message: &str) {
        match &self.notifier {
            Some(n) => n.notify(severity, message),
            None => tracing::debug!("No notifier configured, dropping {:?}: {}", severity, message),
        }
    }

    pub(crate) fn render(&self, key: ElementKey, view: View) {
        if let Some(surface) = &self.surface {
            surface.render(key, view);
        }
    }

    pub(crate) async fn log_activity(&self, event: &str, message: &str, metadata: serde_json::Value) {
        if let Some(log) = &self.activity_log {
            log.record(event, message, metadata).await;
        }
    }
}

/// Run a remote call with an upper bound; elapsing is a failure.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, AstraError>
where
    F: Future<Output = Result<T, AstraError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AstraError::Timeout(limit)),
    }
}
