use std::collections::BTreeMap;

/// Handle returned by [`ListenerRegistry::listen`]; pass it back to
/// `unlisten` to dispose the subscription.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerKey(pub u64);

#[derive(Debug, Clone)]
struct Listener<T, K, A> {
    target: T,
    kinds: Vec<K>,
    action: A,
}

/// Subscriptions of `(target, event kind)` pairs to an action value.
///
/// The registry never calls anything. `dispatch` returns the matching
/// actions in registration order and the owner decides what to do with
/// them, which keeps the mutable state of the owner in one place.
#[derive(Debug, Clone)]
pub struct ListenerRegistry<T, K, A> {
    next_key: u64,
    listeners: BTreeMap<ListenerKey, Listener<T, K, A>>,
}

impl<T, K, A> Default for ListenerRegistry<T, K, A> {
    fn default() -> Self {
        Self {
            next_key: 1,
            listeners: BTreeMap::new(),
        }
    }
}

impl<T, K, A> ListenerRegistry<T, K, A>
where
    T: PartialEq,
    K: PartialEq + Clone,
    A: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `action` to any of `kinds` emitted by `target`.
    pub fn listen(&mut self, target: T, kinds: &[K], action: A) -> ListenerKey {
        let key = ListenerKey(self.next_key);
        self.next_key += 1;
        self.listeners.insert(
            key,
            Listener {
                target,
                kinds: kinds.to_vec(),
                action,
            },
        );
        key
    }

    /// Returns `false` if the key was already disposed.
    pub fn unlisten(&mut self, key: ListenerKey) -> bool {
        self.listeners.remove(&key).is_some()
    }

    pub fn unlisten_all<I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = ListenerKey>,
    {
        keys.into_iter().filter(|k| self.unlisten(*k)).count()
    }

    pub fn contains(&self, key: ListenerKey) -> bool {
        self.listeners.contains_key(&key)
    }

    pub fn dispatch(&self, target: &T, kind: &K) -> Vec<(ListenerKey, A)> {
        self.listeners
            .iter()
            .filter(|(_, l)| l.target == *target && l.kinds.iter().any(|k| k == kind))
            .map(|(key, l)| (*key, l.action.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{ListenerKey, ListenerRegistry};
    use pretty_assertions::assert_eq;

    #[test]
    fn dispatch_returns_matches_in_registration_order() {
        let mut reg: ListenerRegistry<u32, &str, &str> = ListenerRegistry::new();
        let a = reg.listen(1, &["opacity", "visible"], "props");
        let _ = reg.listen(2, &["opacity"], "other");
        let c = reg.listen(1, &["opacity"], "second");
        assert_eq!(reg.dispatch(&1, &"opacity"), vec![(a, "props"), (c, "second")]);
        assert_eq!(reg.dispatch(&1, &"visible"), vec![(a, "props")]);
        assert!(reg.dispatch(&3, &"opacity").is_empty());
    }

    #[test]
    fn unlisten_disposes_once() {
        let mut reg: ListenerRegistry<u32, u8, ()> = ListenerRegistry::new();
        let k = reg.listen(1, &[0], ());
        assert!(reg.contains(k));
        assert!(reg.unlisten(k));
        assert!(!reg.unlisten(k));
        assert!(reg.dispatch(&1, &0).is_empty());
        assert!(!reg.unlisten(ListenerKey(999)));
    }

    #[test]
    fn unlisten_all_counts_live_keys() {
        let mut reg: ListenerRegistry<u32, u8, ()> = ListenerRegistry::new();
        let k1 = reg.listen(1, &[0], ());
        let k2 = reg.listen(1, &[1], ());
        reg.unlisten(k1);
        assert_eq!(reg.unlisten_all([k1, k2]), 1);
        assert!(reg.is_empty());
    }
}
