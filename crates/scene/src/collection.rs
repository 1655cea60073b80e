use std::collections::BTreeMap;

/// Handle types minted by a [`Keyed`] collection.
pub trait CollectionKey: Copy + Ord {
    fn from_raw(raw: u64) -> Self;
}

/// Id-keyed object store with a destroyed flag.
///
/// Once destroyed the collection rejects additions; deferred work checks
/// the flag before touching it.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyed<K, T> {
    next: u64,
    items: BTreeMap<K, T>,
    destroyed: bool,
}

impl<K: CollectionKey, T> Default for Keyed<K, T> {
    fn default() -> Self {
        Self {
            next: 1,
            items: BTreeMap::new(),
            destroyed: false,
        }
    }
}

impl<K: CollectionKey, T> Keyed<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` once destroyed.
    pub fn add(&mut self, item: T) -> Option<K> {
        if self.destroyed {
            return None;
        }
        let key = K::from_raw(self.next);
        self.next += 1;
        self.items.insert(key, item);
        Some(key)
    }

    pub fn remove(&mut self, key: K) -> Option<T> {
        self.items.remove(&key)
    }

    pub fn get(&self, key: K) -> Option<&T> {
        self.items.get(&key)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.items.get_mut(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.items.iter().map(|(k, v)| (*k, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> {
        self.items.iter_mut().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn destroy(&mut self) {
        self.items.clear();
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionKey, Keyed};

    #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
    struct Key(u64);

    impl CollectionKey for Key {
        fn from_raw(raw: u64) -> Self {
            Key(raw)
        }
    }

    #[test]
    fn destroyed_collection_rejects_additions() {
        let mut c: Keyed<Key, &str> = Keyed::new();
        assert_eq!(c.add("a"), Some(Key(1)));
        c.destroy();
        assert!(c.is_destroyed());
        assert!(c.is_empty());
        assert_eq!(c.add("b"), None);
    }
}
