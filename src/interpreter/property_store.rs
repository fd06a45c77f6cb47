//! Insertion-ordered property storage.
//!
//! Small objects keep their properties in an inline list searched linearly.
//! Once an insertion would grow the list past the cutover, the store moves to
//! a hash map plus an explicit order vector. Both representations iterate in
//! insertion order and answer lookups identically.

use std::hash::Hash;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::property::PropertyDescriptor;

const INLINE_PROPERTIES: usize = 4;

#[derive(Clone)]
enum Storage<K> {
    List(SmallVec<[(K, PropertyDescriptor); INLINE_PROPERTIES]>),
    Hash {
        map: FxHashMap<K, PropertyDescriptor>,
        order: Vec<K>,
    },
}

#[derive(Clone)]
pub(crate) struct PropertyDictionary<K> {
    storage: Storage<K>,
    cutover: usize,
}

impl<K: Clone + Eq + Hash> PropertyDictionary<K> {
    pub(crate) fn new(cutover: usize) -> Self {
        Self {
            storage: Storage::List(SmallVec::new()),
            cutover: cutover.max(1),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match &self.storage {
            Storage::List(list) => list.len(),
            Storage::Hash { map, .. } => map.len(),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_hashed(&self) -> bool {
        matches!(self.storage, Storage::Hash { .. })
    }

    pub(crate) fn get(&self, key: &K) -> Option<&PropertyDescriptor> {
        match &self.storage {
            Storage::List(list) => list.iter().find(|(k, _)| k == key).map(|(_, d)| d),
            Storage::Hash { map, .. } => map.get(key),
        }
    }

    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut PropertyDescriptor> {
        match &mut self.storage {
            Storage::List(list) => list.iter_mut().find(|(k, _)| k == key).map(|(_, d)| d),
            Storage::Hash { map, .. } => map.get_mut(key),
        }
    }

    /// Inserts or replaces. A replaced entry keeps its enumeration position.
    pub(crate) fn set(&mut self, key: K, desc: PropertyDescriptor) {
        if let Some(slot) = self.get_mut(&key) {
            *slot = desc;
            return;
        }
        self.append(key, desc);
    }

    // Callers have already ruled out an existing entry for `key`.
    fn append(&mut self, key: K, desc: PropertyDescriptor) {
        if let Storage::List(list) = &mut self.storage
            && list.len() >= self.cutover
        {
            tracing::debug!(len = list.len(), "property store switching to hashed storage");
            let mut map = FxHashMap::default();
            let mut order = Vec::with_capacity(list.len() + 1);
            for (k, d) in list.drain(..) {
                order.push(k.clone());
                map.insert(k, d);
            }
            self.storage = Storage::Hash { map, order };
        }
        match &mut self.storage {
            Storage::List(list) => list.push((key, desc)),
            Storage::Hash { map, order } => {
                order.push(key.clone());
                map.insert(key, desc);
            }
        }
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<PropertyDescriptor> {
        match &mut self.storage {
            Storage::List(list) => {
                let pos = list.iter().position(|(k, _)| k == key)?;
                Some(list.remove(pos).1)
            }
            Storage::Hash { map, order } => {
                let desc = map.remove(key)?;
                order.retain(|k| k != key);
                Some(desc)
            }
        }
    }

    pub(crate) fn iter(&self) -> Iter<'_, K> {
        match &self.storage {
            Storage::List(list) => Iter::List(list.iter()),
            Storage::Hash { map, order } => Iter::Hash {
                map,
                order: order.iter(),
            },
        }
    }

    pub(crate) fn keys(&self) -> Vec<K> {
        self.iter().map(|(k, _)| k.clone()).collect()
    }
}

pub(crate) enum Iter<'a, K> {
    List(std::slice::Iter<'a, (K, PropertyDescriptor)>),
    Hash {
        map: &'a FxHashMap<K, PropertyDescriptor>,
        order: std::slice::Iter<'a, K>,
    },
}

impl<'a, K: Eq + Hash> Iterator for Iter<'a, K> {
    type Item = (&'a K, &'a PropertyDescriptor);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Iter::List(it) => it.next().map(|(k, d)| (k, d)),
            Iter::Hash { map, order } => {
                let map: &'a FxHashMap<K, PropertyDescriptor> = *map;
                let key = order.next()?;
                map.get_key_value(key)
            }
        }
    }
}
