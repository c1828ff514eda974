// crates/astra-ledger/src/rewards.rs
//
// RewardHook: small system credits for in-app actions.
//
// Rewards run after the triggering action has already succeeded from the
// user's point of view. A failed reward is logged and dropped; it never
// changes what the user was told about the action itself.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use astra_core::{Astra, RewardCall, Severity};

use crate::client::LedgerClient;
use crate::collaborators::bounded;

/// Action that earned a reward.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    /// Publishing a post.
    ContentCreation,
    /// Upvoting someone else's post.
    SocialEngagement,
    Other(String),
}

impl ActivityKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityKind::ContentCreation => "content_creation",
            ActivityKind::SocialEngagement => "social_engagement",
            ActivityKind::Other(s) => s,
        }
    }

    /// Banner text, e.g. `CONTENT CREATION`.
    pub fn banner(&self) -> String {
        self.as_str().to_uppercase().replace('_', " ")
    }
}

impl From<&str> for ActivityKind {
    fn from(s: &str) -> Self {
        match s {
            "content_creation" => ActivityKind::ContentCreation,
            "social_engagement" => ActivityKind::SocialEngagement,
            other => ActivityKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RewardHook {
    ledger: Arc<LedgerClient>,
}

impl RewardHook {
    pub fn new(ledger: Arc<LedgerClient>) -> Self {
        Self { ledger }
    }

    /// Credit the current resident. Returns whether the ledger confirmed it.
    ///
    /// Never fails toward the caller.
    pub async fn reward_activity(
        &self,
        kind: ActivityKind,
        amount: Astra,
        metadata: serde_json::Value,
    ) -> bool {
        let collab = self.ledger.collaborators();
        let resident = match collab.session().acting_resident() {
            Some(r) => r,
            None => {
                tracing::debug!("Reward for {} skipped: no signed-in resident", kind);
                return false;
            }
        };
        let procedures = match &collab.procedures {
            Some(p) => p.clone(),
            None => {
                tracing::debug!("Reward for {} skipped: no ledger procedures configured", kind);
                return false;
            }
        };

        tracing::info!("System reward: {} for {}", amount, kind);
        let call = RewardCall {
            resident,
            amount,
            kind: kind.as_str().to_string(),
            metadata: metadata.clone(),
        };
        let outcome = bounded(
            self.ledger.config().request_timeout(),
            procedures.reward(call),
        )
        .await
        .and_then(|reply| reply.into_result());

        if let Err(e) = outcome {
            tracing::warn!("Reward for {} failed: {}", kind, e);
            return false;
        }

        collab.notify(
            Severity::Success,
            &format!("+{} Astra: {}", amount.amount_string(), kind.banner()),
        );
        collab
            .log_activity(
                "astra_reward",
                &format!("Earned {} for {}", amount, kind),
                metadata,
            )
            .await;
        self.ledger.load_balance().await;
        true
    }

    /// Fire-and-forget variant; the caller does not wait for the ledger.
    pub fn spawn_reward(
        &self,
        kind: ActivityKind,
        amount: Astra,
        metadata: serde_json::Value,
    ) -> JoinHandle<bool> {
        let hook = self.clone();
        tokio::spawn(async move { hook.reward_activity(kind, amount, metadata).await })
    }

    /// Reward for publishing a post.
    pub fn on_post_published(&self) -> JoinHandle<bool> {
        let amount = Astra::from_whole(self.ledger.config().post_reward_astr);
        self.spawn_reward(
            ActivityKind::ContentCreation,
            amount,
            serde_json::json!({ "action": "post" }),
        )
    }

    /// Reward for upvoting `post_id`.
    pub fn on_upvote(&self, post_id: &str) -> JoinHandle<bool> {
        let amount = Astra::from_whole(self.ledger.config().upvote_reward_astr);
        self.spawn_reward(
            ActivityKind::SocialEngagement,
            amount,
            serde_json::json!({ "action": "upvote", "target": post_id }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astra_core::{ProcedureReply, Session};

    use crate::collaborators::Collaborators;
    use crate::config::LedgerConfig;
    use crate::memory::{InMemoryLedger, StaticSession, REWARD_PROCEDURE};

    fn hook(ledger: Arc<InMemoryLedger>, session: Session) -> RewardHook {
        let collab = Collaborators::new(Arc::new(StaticSession::new(session))).with_backend(ledger);
        RewardHook::new(Arc::new(LedgerClient::new(collab, LedgerConfig::default())))
    }

    #[test]
    fn test_kind_banner() {
        assert_eq!(ActivityKind::ContentCreation.banner(), "CONTENT CREATION");
        assert_eq!(ActivityKind::from("social_engagement"), ActivityKind::SocialEngagement);
        assert_eq!(ActivityKind::from("quiz").as_str(), "quiz");
    }

    #[tokio::test]
    async fn test_post_reward_credits_and_refreshes() {
        let ledger = Arc::new(InMemoryLedger::new());
        let me = ledger.add_resident("Maya Neural", None, Astra::from_whole(300));
        let hook = hook(ledger.clone(), Session::resident(me));

        assert!(hook.on_post_published().await.unwrap());
        assert_eq!(ledger.balance_of(me), Some(Astra::from_whole(305)));
        assert_eq!(
            hook.ledger.balance().map(|b| b.amount),
            Some(Astra::from_whole(305))
        );
        assert_eq!(ledger.activity_events(), vec!["astra_reward".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_reward_is_swallowed() {
        let ledger = Arc::new(InMemoryLedger::new());
        let me = ledger.add_resident("Maya Neural", None, Astra::from_whole(300));
        ledger.script_reply(REWARD_PROCEDURE, ProcedureReply::failed("Daily cap reached"));
        let hook = hook(ledger.clone(), Session::resident(me));

        assert!(!hook.on_upvote("post-1").await.unwrap());
        assert_eq!(ledger.balance_of(me), Some(Astra::from_whole(300)));
        assert!(ledger.activity_events().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_session_is_skipped() {
        let ledger = Arc::new(InMemoryLedger::new());
        let hook = hook(ledger.clone(), Session::default());
        assert!(
            !hook
                .reward_activity(ActivityKind::ContentCreation, Astra::from_whole(5), serde_json::json!({}))
                .await
        );
        assert_eq!(ledger.calls(REWARD_PROCEDURE), 0);
    }
}
