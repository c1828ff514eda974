// crates/astra-ledger/src/balance.rs
//
// BalanceCell: the client's single cached copy of the resident's balance.
//
// Anyone holding the cell may read it or subscribe to changes (display,
// governance vote weight). Only this crate writes to it, and only from a
// fresh remote read or the degraded-mode placeholder.

use std::sync::{Arc, RwLock};

use serde::Serialize;

use astra_core::Astra;

/// Where the cached value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BalanceSource {
    /// Read from the ledger on the last load.
    Verified,
    /// The ledger was unreachable; display-only stand-in.
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceSnapshot {
    pub amount: Astra,
    pub source: BalanceSource,
}

impl BalanceSnapshot {
    pub fn verified(amount: Astra) -> Self {
        Self {
            amount,
            source: BalanceSource::Verified,
        }
    }

    pub fn placeholder(amount: Astra) -> Self {
        Self {
            amount,
            source: BalanceSource::Placeholder,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.source == BalanceSource::Verified
    }
}

type Subscriber = Arc<dyn Fn(&BalanceSnapshot) + Send + Sync>;

/// Shared cached balance with change notification.
#[derive(Clone, Default)]
pub struct BalanceCell {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    snapshot: RwLock<Option<BalanceSnapshot>>,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl std::fmt::Debug for BalanceCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceCell")
            .field("snapshot", &self.get())
            .finish()
    }
}

impl BalanceCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last loaded snapshot; `None` until the first load completes.
    pub fn get(&self) -> Option<BalanceSnapshot> {
        match self.inner.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// The cached amount, but only if it came from the ledger.
    pub fn verified_amount(&self) -> Option<Astra> {
        self.get().filter(|s| s.is_verified()).map(|s| s.amount)
    }

    /// Register a callback invoked after every write.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&BalanceSnapshot) + Send + Sync + 'static,
    {
        let mut subs = match self.inner.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subs.push(Arc::new(callback));
    }

    pub(crate) fn store(&self, snapshot: BalanceSnapshot) {
        {
            let mut guard = match self.inner.snapshot.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *guard = Some(snapshot);
        }

        // Clone the list so callbacks may read the cell or subscribe again.
        let subs: Vec<Subscriber> = match self.inner.subscribers.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for sub in subs {
            sub(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_empty_until_first_store() {
        let cell = BalanceCell::new();
        assert_eq!(cell.get(), None);
        assert_eq!(cell.verified_amount(), None);
    }

    #[test]
    fn test_placeholder_is_not_verified() {
        let cell = BalanceCell::new();
        cell.store(BalanceSnapshot::placeholder(Astra::from_whole(300)));
        assert_eq!(cell.get().unwrap().amount, Astra::from_whole(300));
        assert_eq!(cell.verified_amount(), None);

        cell.store(BalanceSnapshot::verified(Astra::from_whole(120)));
        assert_eq!(cell.verified_amount(), Some(Astra::from_whole(120)));
    }

    #[test]
    fn test_subscribers_see_every_write() {
        let cell = BalanceCell::new();
        let seen = Arc::new(AtomicU64::new(0));
        let seen_cb = seen.clone();
        cell.subscribe(move |snap| {
            seen_cb.store(snap.amount.micro, Ordering::SeqCst);
        });

        let reader = cell.clone();
        cell.store(BalanceSnapshot::verified(Astra::from_whole(5)));
        assert_eq!(seen.load(Ordering::SeqCst), Astra::from_whole(5).micro);

        cell.store(BalanceSnapshot::verified(Astra::from_whole(7)));
        assert_eq!(seen.load(Ordering::SeqCst), Astra::from_whole(7).micro);
        assert_eq!(reader.get().unwrap().amount, Astra::from_whole(7));
    }
}
