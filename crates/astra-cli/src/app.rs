// crates/astra-cli/src/app.rs
//
// Wires the ledger client components to a backend for one CLI invocation.
//
// Three modes:
//   - backend: the hosted ledger over HTTP (config `[backend]`)
//   - demo:    a seeded in-memory ledger, fresh on every run (`--demo`)
//   - degraded: no backend at all; reads show placeholders, nothing is sent

use std::sync::Arc;

use chrono::{Duration, Utc};

use astra_core::{Astra, AstraError, Proposal, ProposalStatus, Session};
use astra_ledger::{
    Collaborators, Governance, InMemoryLedger, LedgerClient, LedgerConfig, RecipientResolver,
    RewardHook, StaticSession, StaticWallet, TransferOrchestrator,
};
use astra_rpc::RestClient;

use crate::config::CliConfig;
use crate::output::{OutputFormat, StderrNotifier, TerminalSurface};

pub struct App {
    pub client: Arc<LedgerClient>,
    pub resolver: Arc<RecipientResolver>,
    pub transfers: TransferOrchestrator,
    pub rewards: RewardHook,
    pub governance: Governance,
    pub surface: Arc<TerminalSurface>,
    pub format: OutputFormat,
}

impl App {
    pub fn connect(config: &CliConfig, demo: bool, format: OutputFormat) -> Result<Self, AstraError> {
        let surface = Arc::new(TerminalSurface::new());

        let mut wallet = config.wallet_address.clone();
        let collab = if demo {
            tracing::info!("Running against the in-memory demo ledger");
            let (ledger, session) = seed_demo();
            wallet = wallet.or_else(|| Some(DEMO_WALLET.to_string()));
            Collaborators::new(Arc::new(StaticSession::new(session))).with_backend(ledger)
        } else if let Some(backend) = &config.backend {
            let rest = Arc::new(RestClient::new(backend.clone())?);
            tracing::info!("Using ledger at {}", backend.rest_root());
            Collaborators::new(Arc::new(rest.session())).with_backend(rest)
        } else {
            tracing::warn!("No [backend] configured and --demo not set. Running degraded.");
            Collaborators::new(Arc::new(StaticSession::new(Session::default())))
        };
        let collab = collab
            .with_surface(surface.clone())
            .with_notifier(Arc::new(StderrNotifier))
            .with_wallet(Arc::new(StaticWallet::new(wallet.as_deref())));

        Ok(Self::assemble(collab, config.ledger.clone(), surface, format))
    }

    fn assemble(
        collab: Collaborators,
        config: LedgerConfig,
        surface: Arc<TerminalSurface>,
        format: OutputFormat,
    ) -> Self {
        let client = Arc::new(LedgerClient::new(collab.clone(), config.clone()));
        let resolver = Arc::new(RecipientResolver::new(collab, config));
        Self {
            transfers: TransferOrchestrator::new(client.clone(), resolver.clone()),
            rewards: RewardHook::new(client.clone()),
            governance: Governance::new(client.clone()),
            client,
            resolver,
            surface,
            format,
        }
    }
}

/// Wallet bound in demo mode when the config file names none.
pub const DEMO_WALLET: &str = "0x5eed00000000000000000000000000000000a57a";

/// Demo ledger: the signed-in resident is an administrator with 300 ASTR.
pub fn seed_demo() -> (Arc<InMemoryLedger>, Session) {
    let ledger = Arc::new(InMemoryLedger::new());
    let me = ledger.add_resident("Maya Neural", Some("admin"), Astra::from_whole(300));
    let alex = ledger.add_resident("Alex River", Some("resident"), Astra::from_whole(120));
    ledger.add_resident("Alice Park", Some("resident"), Astra::from_whole(80));
    ledger.add_project("proj-quantum", alex);

    let now = Utc::now();
    ledger.add_proposal(Proposal {
        id: "prop-1".to_string(),
        title: "Quantum computing priority".to_string(),
        description: "Direct 30% of the R&D budget to quantum processors.".to_string(),
        votes_for: Astra::from_whole(12_500),
        votes_against: Astra::from_whole(4_200),
        status: ProposalStatus::Active,
        ends_at: now + Duration::days(3),
    });
    ledger.add_proposal(Proposal {
        id: "prop-2".to_string(),
        title: "Open lab weekends".to_string(),
        description: "Keep the fabrication lab open on weekends.".to_string(),
        votes_for: Astra::from_whole(3_100),
        votes_against: Astra::from_whole(3_900),
        status: ProposalStatus::Rejected,
        ends_at: now - Duration::days(2),
    });

    (ledger, Session::admin(me))
}
