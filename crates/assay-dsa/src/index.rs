use alloc::collections::BTreeMap;
use alloc::collections::btree_map::Entry;
use core::fmt;

/// Why an [`IndexedMap::insert`] was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexConflict {
    /// The primary key already has a value.
    Key,
    /// The secondary key already points at another primary key.
    Secondary,
}

impl fmt::Display for IndexConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexConflict::Key => f.write_str("primary key already present"),
            IndexConflict::Secondary => f.write_str("secondary key already bound"),
        }
    }
}

/// A primary map with a unique secondary index kept in lock-step.
///
/// ## Invariant
/// Every value stored under `key` was inserted with exactly one secondary key
/// `sec`, and `secondary[sec] == key`. Both maps are only touched together, so
/// the secondary lookup is injective and never dangles.
#[derive(Clone)]
pub struct IndexedMap<K, S, V> {
    primary: BTreeMap<K, (S, V)>,
    secondary: BTreeMap<S, K>,
}

impl<K, S, V> Default for IndexedMap<K, S, V> {
    fn default() -> Self {
        Self {
            primary: BTreeMap::new(),
            secondary: BTreeMap::new(),
        }
    }
}

impl<K: fmt::Debug, S, V: fmt::Debug> fmt::Debug for IndexedMap<K, S, V> {
    // Secondary keys are credentials in practice; keep them out of debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.primary.iter().map(|(k, (_, v))| (k, v)))
            .finish()
    }
}

impl<K, S, V> IndexedMap<K, S, V>
where
    K: Ord + Clone,
    S: Ord + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`, reachable by `sec`.
    ///
    /// Refuses (and changes nothing) if either key is already taken.
    pub fn insert(&mut self, key: K, sec: S, value: V) -> Result<(), IndexConflict> {
        if self.secondary.contains_key(&sec) {
            return Err(IndexConflict::Secondary);
        }
        match self.primary.entry(key.clone()) {
            Entry::Occupied(_) => Err(IndexConflict::Key),
            Entry::Vacant(slot) => {
                slot.insert((sec.clone(), value));
                self.secondary.insert(sec, key);
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.primary.get(key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.primary.contains_key(key)
    }

    /// Resolves a secondary key to its owning entry.
    pub fn get_by_secondary(&self, sec: &S) -> Option<(&K, &V)> {
        let key = self.secondary.get(sec)?;
        self.primary.get(key).map(|(_, v)| (key, v))
    }

    pub fn secondary_of(&self, key: &K) -> Option<&S> {
        self.primary.get(key).map(|(s, _)| s)
    }

    /// Removes the entry for `key` along with its secondary binding.
    /// Absent keys are a no-op.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let (sec, value) = self.primary.remove(key)?;
        self.secondary.remove(&sec);
        Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &S, &V)> {
        self.primary.iter().map(|(k, (s, v))| (k, s, v))
    }

    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    pub fn clear(&mut self) {
        self.primary.clear();
        self.secondary.clear();
    }
}
