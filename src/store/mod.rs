//! The byte-level seam to the underlying key-value store.
//!
//! [`RawStore`] is the operation surface the client decorates: every method
//! takes and returns raw bytes (`Vec<u8>`) or `None`, never native values.
//! The decorator composes over an implementation of this trait — it never
//! subclasses or reinterprets it — and calls the codec before every write and
//! after every read.
//!
//! [`MemoryStore`] is the in-process implementation shipped with the crate;
//! a network-backed client implements the same trait behind its own
//! connection handling, and its failures pass through as
//! [`Error::Store`](crate::Error::Store).

use std::time::Duration;

use crate::error::Result;

mod memory;

pub use memory::MemoryStore;

/// Options for a single-key set.
///
/// Mirrors the conditional-write and expiry knobs of Redis-style `SET`.
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// Expire the key after this duration.
    pub ttl: Option<Duration>,
    /// Only set when the key does not already exist.
    pub if_not_exists: bool,
    /// Only set when the key already exists.
    pub if_exists: bool,
}

impl SetOptions {
    /// Options with no conditions and no expiry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire the key after `ttl`.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Only set when the key does not already exist.
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Only set when the key already exists.
    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }
}

/// Byte-level operations of the underlying store.
///
/// Keys and hash field names are always strings; values are opaque byte
/// sequences. Multi-value reads preserve positional correspondence with the
/// requested keys, with `None` in place for missing entries.
pub trait RawStore {
    // =========================================================================
    // Strings / plain keys
    // =========================================================================

    /// Set `key` to `value`. Returns whether the write happened (it may not
    /// under `if_not_exists` / `if_exists`).
    fn set(&self, key: &str, value: Vec<u8>, options: &SetOptions) -> Result<bool>;

    /// Get the value at `key`, or `None` when the key is missing.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set several key/value pairs at once.
    fn mset(&self, entries: Vec<(String, Vec<u8>)>) -> Result<()>;

    /// Get several keys at once, order-preservingly; missing keys yield
    /// `None` at their position.
    fn mget(&self, keys: &[&str]) -> Result<Vec<Option<Vec<u8>>>>;

    /// Delete keys. Returns how many existed.
    fn del(&self, keys: &[&str]) -> Result<usize>;

    /// Whether `key` exists.
    fn exists(&self, key: &str) -> Result<bool>;

    // =========================================================================
    // Keyspace metadata
    // =========================================================================

    /// All key names matching a glob pattern (`*` and `?`).
    fn keys(&self, pattern: &str) -> Result<Vec<Vec<u8>>>;

    /// A uniformly random key name, or `None` when the store is empty.
    fn random_key(&self) -> Result<Option<Vec<u8>>>;

    /// The type name stored at `key` ("string", "hash", "set", "list"), or
    /// `None` when the key is missing.
    fn type_of(&self, key: &str) -> Result<Option<Vec<u8>>>;

    // =========================================================================
    // Hashes
    // =========================================================================

    /// Set one field of hash `key`. Returns whether the field was new.
    fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<bool>;

    /// Set several fields of hash `key`. Returns how many were new.
    fn hset_multiple(&self, key: &str, entries: Vec<(String, Vec<u8>)>) -> Result<usize>;

    /// Get one field of hash `key`.
    fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>>;

    /// Get several fields of hash `key`, order-preservingly; missing fields
    /// yield `None` at their position.
    fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<Vec<u8>>>>;

    /// All field names of hash `key`.
    fn hkeys(&self, key: &str) -> Result<Vec<Vec<u8>>>;

    /// All values of hash `key`.
    fn hvals(&self, key: &str) -> Result<Vec<Vec<u8>>>;

    /// All field/value pairs of hash `key`.
    fn hgetall(&self, key: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    // =========================================================================
    // Sets
    // =========================================================================

    /// Add members to set `key`. Returns how many were new.
    fn sadd(&self, key: &str, members: Vec<Vec<u8>>) -> Result<usize>;

    /// Remove members from set `key`. Returns how many were present.
    fn srem(&self, key: &str, members: Vec<Vec<u8>>) -> Result<usize>;

    /// Whether `member` is in set `key`.
    fn sismember(&self, key: &str, member: &[u8]) -> Result<bool>;

    /// All members of set `key`, in no particular order.
    fn smembers(&self, key: &str) -> Result<Vec<Vec<u8>>>;

    /// Remove and return up to `count` random members of set `key`.
    fn spop(&self, key: &str, count: usize) -> Result<Vec<Vec<u8>>>;

    /// Return (without removing) up to `count` distinct random members of set
    /// `key`.
    fn srandmember(&self, key: &str, count: usize) -> Result<Vec<Vec<u8>>>;

    /// Members of the first set not present in any of the others.
    fn sdiff(&self, keys: &[&str]) -> Result<Vec<Vec<u8>>>;

    // =========================================================================
    // Lists
    // =========================================================================

    /// Push values onto the head of list `key`. Returns the new length.
    fn lpush(&self, key: &str, values: Vec<Vec<u8>>) -> Result<usize>;

    /// Push values onto the tail of list `key`. Returns the new length.
    fn rpush(&self, key: &str, values: Vec<Vec<u8>>) -> Result<usize>;

    /// Push onto the head only when the list already exists. Returns the
    /// resulting length (0 when the list is absent).
    fn lpushx(&self, key: &str, value: Vec<u8>) -> Result<usize>;

    /// Push onto the tail only when the list already exists. Returns the
    /// resulting length (0 when the list is absent).
    fn rpushx(&self, key: &str, value: Vec<u8>) -> Result<usize>;

    /// Remove and return up to `count` items from the head of list `key`.
    fn lpop(&self, key: &str, count: usize) -> Result<Vec<Vec<u8>>>;

    /// Remove and return up to `count` items from the tail of list `key`.
    fn rpop(&self, key: &str, count: usize) -> Result<Vec<Vec<u8>>>;

    /// The item at `index` (negative indexes count from the tail).
    fn lindex(&self, key: &str, index: i64) -> Result<Option<Vec<u8>>>;

    /// The items between `start` and `stop` inclusive (negative indexes count
    /// from the tail).
    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>>;
}
