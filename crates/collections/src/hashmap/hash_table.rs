use std::{borrow::Borrow, fmt, iter::Flatten, slice, str::FromStr};

use super::{HashFunction, TableError, TableKey, UnknownPolicy};
use crate::Entry;

pub const DEFAULT_CAPACITY: usize = 100;

/// How keys that hash to an occupied slot are stored
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionPolicy {
    /// Every slot holds a growable chain of entries
    #[default]
    Chaining,
    /// Every slot holds at most one entry, collisions walk forward
    /// one slot at a time (linear probing)
    OpenAddressing,
}

impl CollisionPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Chaining => "chaining",
            Self::OpenAddressing => "open-addressing",
        }
    }
}

impl FromStr for CollisionPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chaining" | "separate-chaining" | "separate_chaining" => Ok(Self::Chaining),
            "open-addressing" | "open_addressing" | "linear-probing" | "linear_probing" => {
                Ok(Self::OpenAddressing)
            }
            _ => Err(UnknownPolicy(s.into())),
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
enum Slots<K, V> {
    Chained(Vec<Vec<Entry<K, V>>>),
    Open(Vec<Option<Entry<K, V>>>),
}

/// A fixed-capacity hash table with a selectable hash function
/// and collision policy.
///
/// Keys are unique: inserting a key that is already present is rejected
/// and leaves the table untouched. The table never resizes, with open
/// addressing an insert into a full table returns [`TableError::TableFull`].
///
/// # Open addressing removal
///
/// Removing an entry clears its slot to empty, there are no tombstones.
/// A key that was displaced past that slot by linear probing becomes
/// unreachable: searching for it stops at the cleared slot and reports
/// nothing, even though the entry is still stored further along.
#[derive(Debug, Clone)]
pub struct HashTable<K, V> {
    slots: Slots<K, V>,
    items: usize,
    hash_fn: HashFunction,
    key_column: Option<String>,
}

impl<K, V> Default for HashTable<K, V> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<K, V> HashTable<K, V> {
    /// Creates an empty table with `capacity` slots
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero
    pub fn new(capacity: usize, hash_fn: HashFunction, policy: CollisionPolicy) -> Self {
        assert_ne!(capacity, 0, "creating a zero-capacity table");

        let slots = match policy {
            CollisionPolicy::Chaining => {
                Slots::Chained((0..capacity).map(|_| Vec::new()).collect())
            }
            CollisionPolicy::OpenAddressing => Slots::Open((0..capacity).map(|_| None).collect()),
        };

        Self {
            slots,
            items: 0,
            hash_fn,
            key_column: None,
        }
    }

    /// Shorthand for a chaining table using the division method
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(capacity, HashFunction::Division, CollisionPolicy::Chaining)
    }

    /// Sets the column tabular loaders key on when the caller does not name one
    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = Some(column.into());
        self
    }

    pub fn default_key_column(&self) -> Option<&str> {
        self.key_column.as_deref()
    }

    /// Returns the number of slots, fixed at construction
    pub fn capacity(&self) -> usize {
        match &self.slots {
            Slots::Chained(buckets) => buckets.len(),
            Slots::Open(slots) => slots.len(),
        }
    }

    /// Returns the number of live entries
    pub fn size(&self) -> usize {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items == 0
    }

    pub fn load_factor(&self) -> f32 {
        self.items as f32 / self.capacity() as f32
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        match self.slots {
            Slots::Chained(_) => CollisionPolicy::Chaining,
            Slots::Open(_) => CollisionPolicy::OpenAddressing,
        }
    }

    pub fn hash_function(&self) -> HashFunction {
        self.hash_fn
    }

    /// Swaps the active hash function.
    ///
    /// Existing entries are NOT rehashed. Anything inserted before the swap
    /// stays where the old function put it, so lookups through the new
    /// function may miss it. Build a new table and reinsert if that matters.
    pub fn set_hash_function(&mut self, hash_fn: HashFunction) {
        self.hash_fn = hash_fn;
    }

    /// Returns the entries stored in slot `idx`: the whole chain
    /// with chaining, zero or one entry with open addressing
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.capacity()`
    pub fn bucket(&self, idx: usize) -> &[Entry<K, V>] {
        match &self.slots {
            Slots::Chained(buckets) => &buckets[idx],
            Slots::Open(slots) => slots[idx].as_slice(),
        }
    }

    // [adapters]

    /// Iterates over all entries: slot order, then insertion order within a chain
    pub fn items(&self) -> Iter<'_, K, V> {
        let inner = match &self.slots {
            Slots::Chained(buckets) => IterInner::Chained(buckets.iter().flatten()),
            Slots::Open(slots) => IterInner::Open(slots.iter().flatten()),
        };

        Iter {
            inner,
            remaining: self.items,
        }
    }
}

impl<K: TableKey + Eq, V> HashTable<K, V> {
    /// Bucket index of `key` under the active hash function
    pub fn index_of<Q: TableKey + ?Sized>(&self, key: &Q) -> usize {
        self.hash_fn.hash(key, self.capacity())
    }

    /// Inserts `key` with `value`.
    ///
    /// Returns `Ok(true)` if the entry was added and `Ok(false)` if `key`
    /// is already present, in which case nothing changes.
    ///
    /// # Errors
    ///
    /// With open addressing, returns [`TableError::TableFull`] when all
    /// `capacity` probes hit occupied slots
    pub fn insert(&mut self, key: K, value: V) -> Result<bool, TableError> {
        let i = self.index_of(&key);

        match &mut self.slots {
            Slots::Chained(buckets) => {
                let bucket = &mut buckets[i];
                if bucket.iter().any(|e| e.key == key) {
                    return Ok(false);
                }
                bucket.push(Entry { key, value });
            }
            Slots::Open(slots) => {
                let Some(free) = free_slot(slots, i, &key)? else {
                    return Ok(false);
                };
                slots[free] = Some(Entry { key, value });
            }
        }

        self.items += 1;
        Ok(true)
    }

    pub fn search<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: TableKey + Eq + ?Sized,
    {
        let i = self.index_of(key);

        match &self.slots {
            Slots::Chained(buckets) => buckets[i]
                .iter()
                .find(|e| e.key.borrow() == key)
                .map(|e| &e.value),
            Slots::Open(slots) => {
                let found = probe_find(slots, i, key)?;
                slots[found].as_ref().map(|e| &e.value)
            }
        }
    }

    pub fn search_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: TableKey + Eq + ?Sized,
    {
        let i = self.index_of(key);

        match &mut self.slots {
            Slots::Chained(buckets) => buckets[i]
                .iter_mut()
                .find(|e| e.key.borrow() == key)
                .map(|e| &mut e.value),
            Slots::Open(slots) => {
                let found = probe_find(slots, i, key)?;
                slots[found].as_mut().map(|e| &mut e.value)
            }
        }
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: TableKey + Eq + ?Sized,
    {
        self.search(key).is_some()
    }

    /// Removes `key`, returning whether it was present.
    ///
    /// See the type-level docs for how this interacts with open addressing
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: TableKey + Eq + ?Sized,
    {
        let i = self.index_of(key);

        let removed = match &mut self.slots {
            Slots::Chained(buckets) => {
                let bucket = &mut buckets[i];
                match bucket.iter().position(|e| e.key.borrow() == key) {
                    Some(pos) => {
                        bucket.remove(pos);
                        true
                    }
                    None => false,
                }
            }
            Slots::Open(slots) => match probe_find(slots, i, key) {
                Some(found) => slots[found].take().is_some(),
                None => false,
            },
        };

        if removed {
            self.items -= 1;
        }
        removed
    }
}

// [probing]

/// Slot indices visited from `start`, wrapping once around the table
fn probe_sequence(start: usize, capacity: usize) -> impl Iterator<Item = usize> {
    (0..capacity).map(move |step| (start + step) % capacity)
}

/// First empty slot on the probe sequence, `None` if `key` is met first
fn free_slot<K: Eq, V>(
    slots: &[Option<Entry<K, V>>],
    start: usize,
    key: &K,
) -> Result<Option<usize>, TableError> {
    for i in probe_sequence(start, slots.len()) {
        match &slots[i] {
            None => return Ok(Some(i)),
            Some(e) if e.key == *key => return Ok(None),
            Some(_) => {}
        }
    }

    Err(TableError::TableFull {
        capacity: slots.len(),
    })
}

/// Slot holding `key`. Stops at the first empty slot
fn probe_find<K, V, Q>(slots: &[Option<Entry<K, V>>], start: usize, key: &Q) -> Option<usize>
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    for i in probe_sequence(start, slots.len()) {
        match &slots[i] {
            None => return None,
            Some(e) if e.key.borrow() == key => return Some(i),
            Some(_) => {}
        }
    }

    None
}

// [iterators]

pub struct Iter<'a, K, V> {
    inner: IterInner<'a, K, V>,
    remaining: usize,
}

enum IterInner<'a, K, V> {
    Chained(Flatten<slice::Iter<'a, Vec<Entry<K, V>>>>),
    Open(Flatten<slice::Iter<'a, Option<Entry<K, V>>>>),
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match &mut self.inner {
            IterInner::Chained(it) => it.next(),
            IterInner::Open(it) => it.next(),
        }?;
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a HashTable<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items()
    }
}
