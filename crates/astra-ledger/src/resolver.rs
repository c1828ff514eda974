// crates/astra-ledger/src/resolver.rs
//
// RecipientResolver: turns typed text into a resolved recipient id.
//
// Every keystroke invalidates the previous selection at once, then waits out
// the debounce window; only the latest input in the window queries the
// directory. A generation counter discards results that arrive after newer
// input, so a slow response can never show stale suggestions.

use std::sync::{Mutex, MutexGuard};

use astra_core::{Resident, ResidentId};

use crate::collaborators::{bounded, Collaborators};
use crate::config::LedgerConfig;
use crate::view::{ElementKey, View};

/// A recipient confirmed through the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecipient {
    pub id: ResidentId,
    pub display_name: String,
}

/// What a keystroke ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Newer input arrived; this one did nothing visible.
    Superseded,
    /// Suggestions were hidden (short query, no match, or failure).
    Hidden,
    Suggestions(Vec<Resident>),
}

#[derive(Debug, Default)]
struct ResolverState {
    text: String,
    selected: Option<ResolvedRecipient>,
    suggestions: Vec<Resident>,
    generation: u64,
}

#[derive(Debug)]
pub struct RecipientResolver {
    collab: Collaborators,
    config: LedgerConfig,
    state: Mutex<ResolverState>,
}

impl RecipientResolver {
    pub fn new(collab: Collaborators, config: LedgerConfig) -> Self {
        Self {
            collab,
            config,
            state: Mutex::new(ResolverState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ResolverState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Handle a change of the recipient text field.
    pub async fn input(&self, text: &str) -> SearchOutcome {
        let generation = {
            let mut state = self.lock();
            state.text = text.to_string();
            state.selected = None;
            state.generation += 1;
            state.generation
        };

        tokio::time::sleep(self.config.search_debounce()).await;
        if !self.is_current(generation) {
            return SearchOutcome::Superseded;
        }

        let query = text.trim();
        if query.chars().count() < self.config.min_query_len {
            self.hide();
            return SearchOutcome::Hidden;
        }

        let found = self.search(query).await;
        if !self.is_current(generation) {
            tracing::debug!("Discarding suggestions for superseded query {:?}", query);
            return SearchOutcome::Superseded;
        }
        if found.is_empty() {
            self.hide();
            return SearchOutcome::Hidden;
        }

        self.lock().suggestions = found.clone();
        self.collab.render(
            ElementKey::RecipientSuggestions,
            View::Suggestions(found.clone()),
        );
        SearchOutcome::Suggestions(found)
    }

    /// Query the directory directly, without debounce or display.
    ///
    /// Excludes the current resident and caps the result. Any failure is an
    /// empty result.
    pub async fn search(&self, query: &str) -> Vec<Resident> {
        let directory = match &self.collab.directory {
            Some(d) => d,
            None => {
                tracing::debug!("Recipient search skipped: no directory configured");
                return Vec::new();
            }
        };
        let exclude = self.collab.session().resident_id;
        let limit = self.config.suggestion_limit;

        match bounded(
            self.config.request_timeout(),
            directory.search(query, exclude, limit),
        )
        .await
        {
            Ok(mut found) => {
                found.retain(|r| Some(r.id) != exclude);
                found.truncate(limit);
                found
            }
            Err(e) => {
                tracing::warn!("Recipient search for {:?} failed: {}", query, e);
                Vec::new()
            }
        }
    }

    /// Pick a suggestion. The field shows its name and the list closes.
    pub fn select(&self, resident: &Resident) {
        {
            let mut state = self.lock();
            state.selected = Some(ResolvedRecipient {
                id: resident.id,
                display_name: resident.display_name.clone(),
            });
            state.text = resident.display_name.clone();
            state.suggestions.clear();
            // Cancel any search still waiting out its debounce.
            state.generation += 1;
        }
        self.collab.render(ElementKey::RecipientSuggestions, View::Hidden);
    }

    /// Pick one of the currently shown suggestions by id.
    pub fn select_id(&self, id: ResidentId) -> bool {
        let resident = self.lock().suggestions.iter().find(|r| r.id == id).cloned();
        match resident {
            Some(r) => {
                self.select(&r);
                true
            }
            None => false,
        }
    }

    /// The selected recipient, while the field still shows its name.
    pub fn resolved(&self) -> Option<ResolvedRecipient> {
        let state = self.lock();
        state
            .selected
            .clone()
            .filter(|s| s.display_name == state.text)
    }

    pub fn text(&self) -> String {
        self.lock().text.clone()
    }

    pub fn suggestions(&self) -> Vec<Resident> {
        self.lock().suggestions.clone()
    }

    /// Reset the field, e.g. after a completed transfer.
    pub fn clear(&self) {
        {
            let mut state = self.lock();
            state.text.clear();
            state.selected = None;
            state.suggestions.clear();
            state.generation += 1;
        }
        self.collab.render(ElementKey::RecipientSuggestions, View::Hidden);
    }

    fn hide(&self) {
        self.lock().suggestions.clear();
        self.collab.render(ElementKey::RecipientSuggestions, View::Hidden);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use astra_core::{Astra, Session};

    use crate::markup::HtmlSurface;
    use crate::memory::{InMemoryLedger, StaticSession};

    struct Fixture {
        ledger: Arc<InMemoryLedger>,
        resolver: Arc<RecipientResolver>,
        surface: Arc<HtmlSurface>,
        me: ResidentId,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(InMemoryLedger::new());
        let me = ledger.add_resident("Alan Self", None, Astra::from_whole(300));
        ledger.add_resident("Alex River", Some("resident"), Astra::zero());
        ledger.add_resident("Alice Park", Some("admin"), Astra::zero());
        let surface = Arc::new(HtmlSurface::new());
        let collab = Collaborators::new(Arc::new(StaticSession::new(Session::resident(me))))
            .with_backend(ledger.clone())
            .with_surface(surface.clone());
        Fixture {
            ledger,
            resolver: Arc::new(RecipientResolver::new(collab, LedgerConfig::default())),
            surface,
            me,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_excludes_current_resident() {
        let f = fixture();
        match f.resolver.input("al").await {
            SearchOutcome::Suggestions(found) => {
                let names: Vec<_> = found.iter().map(|r| r.display_name.as_str()).collect();
                assert_eq!(names, vec!["Alex River", "Alice Park"]);
                assert!(found.iter().all(|r| r.id != f.me));
            }
            other => panic!("expected suggestions, got {:?}", other),
        }
        let html = f.surface.markup(ElementKey::RecipientSuggestions).unwrap();
        assert!(html.contains("Alice Park"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_suggestions_follow_latest_input() {
        let f = fixture();
        f.resolver.input("ali").await;
        let names: Vec<_> = f
            .resolver
            .suggestions()
            .into_iter()
            .map(|r| r.display_name)
            .collect();
        assert_eq!(names, vec!["Alice Park".to_string()]);

        f.resolver.input("zz").await;
        assert!(f.resolver.suggestions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_hides_without_searching() {
        let f = fixture();
        assert_eq!(f.resolver.input("a").await, SearchOutcome::Hidden);
        assert_eq!(f.ledger.calls("residents"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_typing_searches_once() {
        let f = fixture();
        let r1 = f.resolver.clone();
        let first = tokio::spawn(async move { r1.input("al").await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = f.resolver.input("ali").await;

        assert_eq!(first.await.unwrap(), SearchOutcome::Superseded);
        match second {
            SearchOutcome::Suggestions(found) => assert_eq!(found.len(), 1),
            other => panic!("expected suggestions, got {:?}", other),
        }
        assert_eq!(f.ledger.calls("residents"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_hides_suggestions() {
        let f = fixture();
        f.ledger.set_offline(true);
        assert_eq!(f.resolver.input("alex").await, SearchOutcome::Hidden);
        assert_eq!(f.surface.markup(ElementKey::RecipientSuggestions).unwrap(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_editing_after_select_invalidates() {
        let f = fixture();
        let found = match f.resolver.input("alex").await {
            SearchOutcome::Suggestions(found) => found,
            other => panic!("expected suggestions, got {:?}", other),
        };
        assert!(f.resolver.select_id(found[0].id));
        assert_eq!(f.resolver.text(), "Alex River");
        assert_eq!(f.resolver.resolved().map(|r| r.id), Some(found[0].id));

        let _ = f.resolver.input("Alex Rive").await;
        assert_eq!(f.resolver.resolved(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_cancels_pending_search() {
        let f = fixture();
        let alice = Resident {
            id: ResidentId::new_v7(),
            display_name: "Alice Park".to_string(),
            role: None,
        };
        let r1 = f.resolver.clone();
        let pending = tokio::spawn(async move { r1.input("ali").await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        f.resolver.select(&alice);

        assert_eq!(pending.await.unwrap(), SearchOutcome::Superseded);
        assert_eq!(f.resolver.resolved().map(|r| r.id), Some(alice.id));
    }
}
