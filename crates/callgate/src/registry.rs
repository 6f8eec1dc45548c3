//! Identity registry for deep wrapping.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError, Weak};

use crate::object::{Object, ObjectId, ObjectInner};

/// Entry count at which dead entries are first swept.
const PRUNE_THRESHOLD: usize = 64;

struct Entries {
    wrappers: HashMap<ObjectId, Weak<ObjectInner>>,
    prune_at: usize,
}

impl Entries {
    /// Drop entries whose wrapper is gone once the map reaches `prune_at`.
    /// The next sweep waits until the surviving entries have doubled.
    fn prune_if_due(&mut self) {
        if self.wrappers.len() < self.prune_at {
            return;
        }

        let before = self.wrappers.len();
        self.wrappers.retain(|_, wrapper| wrapper.strong_count() > 0);
        self.prune_at = (self.wrappers.len() * 2).max(PRUNE_THRESHOLD);

        tracing::trace!(
            before,
            after = self.wrappers.len(),
            "pruned dead wrapper entries"
        );
    }
}

/// Maps a target's identity to the wrapper created for it.
///
/// Entries hold the wrapper weakly: a target reachable only through the
/// wrapped graph gets one wrapper for as long as anyone holds it, and the
/// registry never keeps a wrapper (or, through it, its target) alive. A
/// dead entry is replaced on the next lookup of its target, and dead entries
/// are swept whenever the map has doubled since the last sweep. Lookups and
/// insertions happen under one lock, so two threads racing to wrap the same
/// object observe the same wrapper.
pub(crate) struct WrapRegistry {
    entries: Mutex<Entries>,
}

impl WrapRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(Entries {
                wrappers: HashMap::new(),
                prune_at: PRUNE_THRESHOLD,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the live wrapper registered for `target`, or register the one
    /// built by `make`.
    pub(crate) fn get_or_insert_with(&self, target: &Object, make: impl FnOnce() -> Object) -> Object {
        let mut entries = self.lock();

        if let Some(existing) = entries.wrappers.get(&target.id()).and_then(Object::upgrade) {
            return existing;
        }

        entries.prune_if_due();

        let wrapper = make();
        entries.wrappers.insert(target.id(), wrapper.downgrade());
        wrapper
    }

    /// Number of targets with a live wrapper.
    pub(crate) fn live_count(&self) -> usize {
        self.lock()
            .wrappers
            .values()
            .filter(|wrapper| wrapper.strong_count() > 0)
            .count()
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.lock().wrappers.len()
    }
}

impl fmt::Debug for WrapRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_wraps_each_target_once() {
        let registry = WrapRegistry::new();
        let target = Object::new();
        let built = Cell::new(0);

        let first = registry.get_or_insert_with(&target, || {
            built.set(built.get() + 1);
            Object::new()
        });
        let second = registry.get_or_insert_with(&target, || {
            built.set(built.get() + 1);
            Object::new()
        });

        assert_eq!(built.get(), 1);
        assert_eq!(first, second);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_distinct_targets() {
        let registry = WrapRegistry::new();
        let a = registry.get_or_insert_with(&Object::new(), Object::new);
        let b = registry.get_or_insert_with(&Object::new(), Object::new);

        assert_ne!(a, b);
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn test_dead_wrapper_is_replaced() {
        let registry = WrapRegistry::new();
        let target = Object::new();

        let first_id = registry.get_or_insert_with(&target, Object::new).id();
        assert_eq!(registry.live_count(), 0);

        let second = registry.get_or_insert_with(&target, Object::new);
        assert_ne!(second.id(), first_id);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_dead_entries_are_pruned() {
        let registry = WrapRegistry::new();

        for _ in 0..1000 {
            registry.get_or_insert_with(&Object::new(), Object::new);
        }

        assert!(registry.entry_count() <= PRUNE_THRESHOLD);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_pruning_keeps_live_wrappers() {
        let registry = WrapRegistry::new();
        let targets: Vec<Object> = (0..100).map(|_| Object::new()).collect();
        let wrappers: Vec<Object> = targets
            .iter()
            .map(|target| registry.get_or_insert_with(target, Object::new))
            .collect();

        for _ in 0..1000 {
            registry.get_or_insert_with(&Object::new(), Object::new);
        }

        assert_eq!(registry.live_count(), 100);
        for (target, wrapper) in targets.iter().zip(&wrappers) {
            assert_eq!(&registry.get_or_insert_with(target, Object::new), wrapper);
        }
    }
}
