//! The process-wide registry of structural innovations.
//!
//! Two genes created by the same kind of structural mutation between the
//! same two node ids, anywhere in the population, must carry the same
//! innovation number so crossover and speciation can align them by history
//! rather than by position.

use fxhash::FxHashMap;
use std::sync::Mutex;

/// Tags the *kind* of structural event that produced a connection gene. Part
/// of the innovation key alongside the node pair, so an add-connection event
/// between `(u, v)` and an add-node bisection that happens to also touch
/// `(u, v)` never collide on the same innovation number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    AddConnection,
    AddNode,
}

type InnovationKey = (Origin, usize, usize);

/// Lookup-or-allocate table from `(origin, in_node, out_node)` to a
/// monotonically increasing innovation number. Shared across every species'
/// mutation calls within a run; `lookup_or_insert` must be safe to call
/// concurrently since the population driver mutates species in parallel
/// (see the crate's task-parallel epoch model).
pub struct InnovationRegistry {
    inner: Mutex<Inner>,
}

struct Inner {
    next: usize,
    seen: FxHashMap<InnovationKey, usize>,
}

impl InnovationRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next: 0,
                seen: FxHashMap::default(),
            }),
        }
    }

    /// Return the innovation number for `(origin, in_node, out_node)`,
    /// allocating a fresh one on first sight.
    pub fn lookup_or_insert(&self, origin: Origin, in_node: usize, out_node: usize) -> usize {
        let key = (origin, in_node, out_node);
        let mut inner = self.inner.lock().expect("innovation registry poisoned");
        if let Some(&id) = inner.seen.get(&key) {
            return id;
        }
        let id = inner.next;
        inner.next += 1;
        inner.seen.insert(key, id);
        id
    }

    /// Clear every recorded mapping and reset the counter. Called once at
    /// the start of a fresh experiment run; innovation numbers are only
    /// meaningful relative to a single registry's lifetime.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("innovation registry poisoned");
        inner.next = 0;
        inner.seen.clear();
    }

    /// How many distinct innovations this registry has issued so far.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("innovation registry poisoned").next
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InnovationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_returns_same_id() {
        let reg = InnovationRegistry::new();
        let a = reg.lookup_or_insert(Origin::AddConnection, 0, 3);
        let b = reg.lookup_or_insert(Origin::AddConnection, 0, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn different_origin_same_nodes_differs() {
        let reg = InnovationRegistry::new();
        let a = reg.lookup_or_insert(Origin::AddConnection, 0, 3);
        let b = reg.lookup_or_insert(Origin::AddNode, 0, 3);
        assert_ne!(a, b);
    }

    #[test]
    fn ids_are_monotonic() {
        let reg = InnovationRegistry::new();
        let a = reg.lookup_or_insert(Origin::AddConnection, 0, 1);
        let b = reg.lookup_or_insert(Origin::AddConnection, 1, 2);
        assert!(b > a);
    }

    #[test]
    fn reset_clears_history() {
        let reg = InnovationRegistry::new();
        reg.lookup_or_insert(Origin::AddConnection, 0, 3);
        reg.reset();
        assert_eq!(reg.len(), 0);
        let fresh = reg.lookup_or_insert(Origin::AddConnection, 0, 3);
        assert_eq!(fresh, 0);
    }

    #[test]
    fn concurrent_allocation_never_duplicates() {
        use std::sync::Arc;
        let reg = Arc::new(InnovationRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let reg = reg.clone();
                std::thread::spawn(move || reg.lookup_or_insert(Origin::AddConnection, i, i + 1))
            })
            .collect();
        let mut ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }
}
