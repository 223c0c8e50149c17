//! In-flight registry for cancellable effects.
//!
//! Every running [`Effect::Cancellable`](tasklist_core::effect::Effect) owns a
//! [`Registration`]: one [`CancellationToken`] filed under each of its
//! [`EffectId`]s. Reducing `Effect::Cancel(id)` cancels every token filed
//! under `id`. A registration removes itself from the registry when dropped.
//!
//! The store registers and cancels while holding its state write lock, so
//! whether an outcome is still wanted is decided by the order in which the
//! request, the discard and the outcome are reduced.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tasklist_core::effect::EffectId;
use tokio_util::sync::CancellationToken;

type Entries = HashMap<EffectId, HashMap<u64, CancellationToken>>;

/// Tokens of in-flight cancellable effects, grouped by effect id.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    next_key: AtomicU64,
    entries: Mutex<Entries>,
}

impl InFlightRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File a fresh token under every id in `ids`.
    #[must_use]
    pub fn register(self: &Arc<Self>, ids: &[EffectId]) -> Registration {
        let token = CancellationToken::new();
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);

        let mut entries = self.lock();
        for id in ids {
            entries
                .entry(id.clone())
                .or_default()
                .insert(key, token.clone());
        }

        Registration {
            registry: Arc::clone(self),
            token,
            key,
            ids: ids.to_vec(),
        }
    }

    /// Cancel every in-flight effect filed under `id`.
    ///
    /// Returns the number of tokens cancelled.
    pub fn cancel(&self, id: &EffectId) -> usize {
        let entries = self.lock();
        entries.get(id).map_or(0, |tokens| {
            for token in tokens.values() {
                token.cancel();
            }
            tokens.len()
        })
    }

    /// Number of in-flight effects filed under `id`
    #[must_use]
    pub fn in_flight(&self, id: &EffectId) -> usize {
        self.lock().get(id).map_or(0, HashMap::len)
    }

    /// Returns true if nothing is in flight
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn release(&self, key: u64, ids: &[EffectId]) {
        let mut entries = self.lock();
        for id in ids {
            if let Some(tokens) = entries.get_mut(id) {
                tokens.remove(&key);
                if tokens.is_empty() {
                    entries.remove(id);
                }
            }
        }
    }

    // Entries stay consistent across a panic: every mutation is a single
    // insert or remove.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Membership of one running effect in the [`InFlightRegistry`].
#[derive(Debug)]
pub struct Registration {
    registry: Arc<InFlightRegistry>,
    token: CancellationToken,
    key: u64,
    ids: Vec<EffectId>,
}

impl Registration {
    /// Token cancelled by a matching `Effect::Cancel`
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns true once a matching `Effect::Cancel` has been reduced
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Ids this effect was filed under
    #[must_use]
    pub fn ids(&self) -> &[EffectId] {
        &self.ids
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.release(self.key, &self.ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATE: EffectId = EffectId::from_static("CREATE_TODO");
    const REMOVE: EffectId = EffectId::from_static("REMOVE_TODO");

    #[test]
    fn cancel_hits_every_registration_of_the_id() {
        let registry = Arc::new(InFlightRegistry::new());
        let first = registry.register(&[CREATE]);
        let second = registry.register(&[CREATE]);
        let other = registry.register(&[REMOVE]);

        assert_eq!(registry.in_flight(&CREATE), 2);
        assert_eq!(registry.cancel(&CREATE), 2);

        assert!(first.is_cancelled());
        assert!(second.is_cancelled());
        assert!(!other.is_cancelled());
    }

    #[test]
    fn drop_releases_entry() {
        let registry = Arc::new(InFlightRegistry::new());
        let registration = registry.register(&[CREATE, REMOVE]);
        assert_eq!(registration.ids().len(), 2);
        assert_eq!(registry.in_flight(&REMOVE), 1);

        drop(registration);

        assert!(registry.is_empty());
        assert_eq!(registry.cancel(&CREATE), 0);
    }

    #[test]
    fn later_registration_is_not_cancelled_by_earlier_cancel() {
        let registry = Arc::new(InFlightRegistry::new());
        let early = registry.register(&[CREATE]);
        registry.cancel(&CREATE);
        let late = registry.register(&[CREATE]);

        assert!(early.is_cancelled());
        assert!(!late.is_cancelled());
    }
}
