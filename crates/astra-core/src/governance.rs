// crates/astra-core/src/governance.rs
//
// Governance proposals. Votes are weighted by the voter's Astra balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::token::Astra;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Active,
    Passed,
    Rejected,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub votes_for: Astra,
    pub votes_against: Astra,
    pub status: ProposalStatus,
    pub ends_at: DateTime<Utc>,
}

impl Proposal {
    /// Share of the weighted vote in favour, as a whole percentage.
    /// A proposal with no votes yet reports 0.
    pub fn percent_for(&self) -> u8 {
        let total = self.votes_for.micro as u128 + self.votes_against.micro as u128;
        if total == 0 {
            return 0;
        }
        let pct = (self.votes_for.micro as u128 * 100 + total / 2) / total;
        pct.min(100) as u8
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == ProposalStatus::Active && self.ends_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn proposal(yes: u64, no: u64) -> Proposal {
        Proposal {
            id: "prop_01".to_string(),
            title: "List ASTR on a DEX".to_string(),
            description: "Add an ASTR/USDT liquidity pool.".to_string(),
            votes_for: Astra::from_whole(yes),
            votes_against: Astra::from_whole(no),
            status: ProposalStatus::Active,
            ends_at: Utc::now() + Duration::days(3),
        }
    }

    #[test]
    fn test_percent_for() {
        assert_eq!(proposal(12_500, 4_200).percent_for(), 75);
        assert_eq!(proposal(1, 0).percent_for(), 100);
        assert_eq!(proposal(0, 0).percent_for(), 0);
    }

    #[test]
    fn test_is_open() {
        let now = Utc::now();
        let mut p = proposal(1, 1);
        assert!(p.is_open(now));
        p.ends_at = now - Duration::seconds(1);
        assert!(!p.is_open(now));
        p.ends_at = now + Duration::days(1);
        p.status = ProposalStatus::Closed;
        assert!(!p.is_open(now));
    }
}
