// crates/astra-core/src/resident.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of a portal resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResidentId(pub Uuid);

impl ResidentId {
    /// Generate a fresh time-ordered id.
    pub fn new_v7() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for ResidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ResidentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A directory entry. Ledger entries reference residents, never own them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    pub id: ResidentId,
    pub display_name: String,
    /// Free-form role label from the directory ("resident", "admin", ...).
    pub role: Option<String>,
}

/// The current user as seen by the identity provider.
///
/// An unauthenticated session is read-only: no transfers, grants,
/// contributions or votes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub resident_id: Option<ResidentId>,
    pub authenticated: bool,
    pub admin: bool,
}

impl Session {
    /// An authenticated, non-admin session for `resident_id`.
    pub fn resident(resident_id: ResidentId) -> Self {
        Self {
            resident_id: Some(resident_id),
            authenticated: true,
            admin: false,
        }
    }

    /// An authenticated admin session for `resident_id`.
    pub fn admin(resident_id: ResidentId) -> Self {
        Self {
            resident_id: Some(resident_id),
            authenticated: true,
            admin: true,
        }
    }

    /// The resident id, but only for an authenticated session.
    pub fn acting_resident(&self) -> Option<ResidentId> {
        if self.authenticated {
            self.resident_id
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resident_id_roundtrip_through_str() {
        let id = ResidentId::new_v7();
        let parsed: ResidentId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_unauthenticated_session_has_no_acting_resident() {
        let id = ResidentId::new_v7();
        let session = Session {
            resident_id: Some(id),
            authenticated: false,
            admin: false,
        };
        assert_eq!(session.acting_resident(), None);
        assert_eq!(Session::resident(id).acting_resident(), Some(id));
    }
}
