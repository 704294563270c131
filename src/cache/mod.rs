// Cache module for the local key-value view.
// Validated keys and the in-memory store shared by handles and the sync loop.

pub mod key;
pub mod store;

pub use key::{Key, RESERVED_DELIMITER};
pub use store::{CacheStore, CachedValue};
