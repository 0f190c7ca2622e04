use thiserror::Error;

mod hash_fn;
mod hash_table;

pub use hash_fn::{HashFunction, TableKey};
pub use hash_table::{CollisionPolicy, HashTable, Iter, DEFAULT_CAPACITY};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Linear probing visited every slot without finding a free one.
    /// The table never grows, so the caller has to reject the entry
    /// or rebuild with a larger capacity
    #[error("Hash table is full, no free slot reachable within {capacity} probes")]
    TableFull { capacity: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown collision policy '{0}', expected one of: chaining, open-addressing")]
pub struct UnknownPolicy(pub String);
