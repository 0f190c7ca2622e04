pub mod hashmap;

pub use hashmap::{
    CollisionPolicy, HashFunction, HashTable, Iter, TableError, TableKey, UnknownPolicy,
    DEFAULT_CAPACITY,
};

/// A key-value pair as stored in one slot of a [`HashTable`]
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Entry<K, V> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }
}
