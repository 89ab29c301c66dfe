/// Ordered key/value store backed by parallel vectors.
///
/// Keys are unique. Lookups are linear, which is fine for the handful of
/// entries a data bank or frame table carries, and insertion order is kept so
/// iteration is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedTable<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
}

impl<K, V> Default for KeyedTable<K, V> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<K: PartialEq, V> KeyedTable<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn index_of(&self, key: &K) -> Option<usize> {
        self.keys.iter().position(|candidate| candidate == key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index_of(key).is_some()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.index_of(key).map(|idx| &self.values[idx])
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.index_of(key).map(|idx| &mut self.values[idx])
    }

    /// Inserts or replaces. Replacing keeps the key's original position.
    pub fn set(&mut self, key: K, value: V) -> &mut V {
        let idx = match self.index_of(&key) {
            Some(idx) => {
                self.values[idx] = value;
                idx
            }
            None => {
                self.keys.push(key);
                self.values.push(value);
                self.values.len() - 1
            }
        };
        &mut self.values[idx]
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index_of(key)?;
        self.keys.remove(idx);
        Some(self.values.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.values.iter()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.values.iter_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.keys.iter().zip(self.values.iter())
    }
}

impl<K: PartialEq + Clone, V: Clone> KeyedTable<K, V> {
    /// Upserts every entry of `self` into `other`.
    pub fn copy_into(&self, other: &mut KeyedTable<K, V>) {
        for (key, value) in self.iter() {
            other.set(key.clone(), value.clone());
        }
    }
}
