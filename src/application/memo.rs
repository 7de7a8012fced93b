// Memoized derivations keyed by store revisions
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Caches one derived value until the revision it was computed from changes.
pub struct Memo<R, T> {
    slot: Mutex<Option<(R, Arc<T>)>>,
}

impl<R: PartialEq + Copy, T> Memo<R, T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn get_or_compute(&self, revision: R, compute: impl FnOnce() -> T) -> Arc<T> {
        let mut slot = self.slot.lock();
        if let Some((cached, value)) = slot.as_ref() {
            if *cached == revision {
                return value.clone();
            }
        }
        let value = Arc::new(compute());
        *slot = Some((revision, value.clone()));
        value
    }
}

impl<R: PartialEq + Copy, T> Default for Memo<R, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Like [`Memo`], one slot per key.
pub struct KeyedMemo<K, R, T> {
    slots: Mutex<HashMap<K, (R, Arc<T>)>>,
}

impl<K: Eq + Hash, R: PartialEq + Copy, T> KeyedMemo<K, R, T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_compute(&self, key: K, revision: R, compute: impl FnOnce() -> T) -> Arc<T> {
        let mut slots = self.slots.lock();
        if let Some((cached, value)) = slots.get(&key) {
            if *cached == revision {
                return value.clone();
            }
        }
        let value = Arc::new(compute());
        slots.insert(key, (revision, value.clone()));
        value
    }

    /// Drops every slot whose key fails `keep`.
    pub fn retain(&self, keep: impl Fn(&K) -> bool) {
        self.slots.lock().retain(|key, _| keep(key));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

impl<K: Eq + Hash, R: PartialEq + Copy, T> Default for KeyedMemo<K, R, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_memo_recomputes_only_on_revision_change() {
        let memo: Memo<u64, usize> = Memo::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            calls.get()
        };

        assert_eq!(*memo.get_or_compute(1, compute), 1);
        assert_eq!(*memo.get_or_compute(1, compute), 1);
        assert_eq!(calls.get(), 1);
        assert_eq!(*memo.get_or_compute(2, compute), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_keyed_memo_isolates_keys() {
        let memo: KeyedMemo<&str, (u64, u64), String> = KeyedMemo::new();
        let a = memo.get_or_compute("a", (1, 1), || "a1".to_string());
        let b = memo.get_or_compute("b", (1, 1), || "b1".to_string());
        assert_eq!(*a, "a1");
        assert_eq!(*b, "b1");

        let a_again = memo.get_or_compute("a", (1, 1), || "never".to_string());
        assert!(Arc::ptr_eq(&a, &a_again));

        let a_next = memo.get_or_compute("a", (2, 1), || "a2".to_string());
        assert_eq!(*a_next, "a2");

        memo.retain(|key| *key != "b");
        assert_eq!(memo.len(), 1);
        let b_again = memo.get_or_compute("b", (1, 1), || "b-fresh".to_string());
        assert_eq!(*b_again, "b-fresh");
    }
}
