//! Update Observers
//!
//! Views register a callback to hear about history changes. The registry is
//! single-threaded (`Rc`), matching the feed: callbacks run on the task that
//! delivers messages.
//!
//! Notification works on a copy of the current callbacks (`listeners()`), so a
//! callback may register, unregister, or close the feed while it runs without
//! holding any borrow of the registry.

use std::rc::Rc;

use crate::snapshot::Snapshot;

/// Callback invoked with the new history after every change
pub type UpdateCallback = Rc<dyn Fn(&Snapshot)>;

/// Token returned by registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    entries: Vec<(ObserverId, UpdateCallback)>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, callback: UpdateCallback) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    /// Remove a callback; `false` if the id was not registered
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Callbacks to notify for one update
    pub fn listeners(&self) -> Vec<(ObserverId, UpdateCallback)> {
        self.entries.clone()
    }

    pub fn contains(&self, id: ObserverId) -> bool {
        self.entries.iter().any(|(entry_id, _)| *entry_id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl core::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("next_id", &self.next_id)
            .field("observers", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn register_and_notify() {
        let mut registry = ObserverRegistry::new();
        let calls = Rc::new(Cell::new(0));

        let counter = calls.clone();
        registry.register(Rc::new(move |_: &Snapshot| counter.set(counter.get() + 1)));
        let counter = calls.clone();
        registry.register(Rc::new(move |_: &Snapshot| counter.set(counter.get() + 10)));

        let snapshot = Snapshot::empty();
        for (_, callback) in registry.listeners() {
            callback(&snapshot);
        }
        assert_eq!(calls.get(), 11);
    }

    #[test]
    fn unregister() {
        let mut registry = ObserverRegistry::new();
        let first = registry.register(Rc::new(|_: &Snapshot| {}));
        let second = registry.register(Rc::new(|_: &Snapshot| {}));
        assert_ne!(first, second);

        assert!(registry.unregister(first));
        assert!(!registry.unregister(first));
        assert!(!registry.contains(first));
        assert!(registry.contains(second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut registry = ObserverRegistry::new();
        let first = registry.register(Rc::new(|_: &Snapshot| {}));
        registry.clear();
        let second = registry.register(Rc::new(|_: &Snapshot| {}));
        assert!(second > first);
    }
}
