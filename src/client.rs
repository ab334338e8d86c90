//! The type-preserving client decorator.
//!
//! [`DirectClient`] composes over any [`RawStore`] and exposes the same
//! operation surface with [`Value`] in place of raw bytes: every write runs
//! each value through [`codec::encode`], every read runs each element through
//! [`codec::decode`] independently and order-preservingly. Keys and hash
//! field names are always strings and are never encoded.
//!
//! Read operations that return stored values take a [`DecodeHint`] so callers
//! who know what they stored can steer the text-vs-binary guess; key and
//! metadata listings apply only the text half of the codec. Store failures
//! pass through unmodified.
//!
//! # Example
//!
//! ```
//! use directkv::{DecodeHint, DirectClient, MemoryStore, Value};
//!
//! let client = DirectClient::new(MemoryStore::new());
//! client.set("answer", 42i64).unwrap();
//! let got = client.get("answer", DecodeHint::BinaryFirst).unwrap();
//! assert_eq!(got, Some(Value::Int(42)));
//! ```

use std::collections::HashMap;

use tracing::trace;

use crate::codec::{self, DecodeHint};
use crate::error::{Error, Result};
use crate::store::{RawStore, SetOptions};
use crate::tensor::Tensor;
use crate::value::Value;

/// Decorator over a byte-level store, preserving native value types.
///
/// Holds the store by composition; [`DirectClient::store`] exposes it for
/// operations this layer does not wrap.
pub struct DirectClient<S: RawStore> {
    store: S,
}

impl<S: RawStore> DirectClient<S> {
    /// Wrap a store.
    pub fn new(store: S) -> Self {
        DirectClient { store }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unwrap back into the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }

    // =========================================================================
    // Strings / plain keys
    // =========================================================================

    /// Set `key` to `value` with no conditions and no expiry.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<bool> {
        self.set_with_options(key, value, &SetOptions::new())
    }

    /// Set `key` to `value` under [`SetOptions`]. Returns whether the write
    /// happened.
    pub fn set_with_options(
        &self,
        key: &str,
        value: impl Into<Value>,
        options: &SetOptions,
    ) -> Result<bool> {
        trace!(key, "set");
        self.store.set(key, codec::encode(&value.into())?, options)
    }

    /// Get the value at `key`, or `None` when the key is missing.
    pub fn get(&self, key: &str, hint: DecodeHint) -> Result<Option<Value>> {
        trace!(key, "get");
        let encoded = self.store.get(key)?;
        Ok(codec::decode(encoded.as_deref(), hint))
    }

    /// Set several keys from a mapping. Each value is encoded independently;
    /// an empty mapping is rejected with [`Error::InvalidArgument`].
    pub fn mset(&self, mapping: &HashMap<String, Value>) -> Result<()> {
        if mapping.is_empty() {
            return Err(Error::InvalidArgument(
                "mset requires at least one key/value pair".to_owned(),
            ));
        }
        trace!(keys = mapping.len(), "mset");
        let pairs = codec::encode_pairs(mapping.iter().map(|(k, v)| (k.as_str(), v)))?;
        self.store.mset(pairs)
    }

    /// Get several keys, order-preservingly; a missing key decodes to `None`
    /// at its position, never skipped.
    pub fn mget(&self, keys: &[&str], hint: DecodeHint) -> Result<Vec<Option<Value>>> {
        trace!(keys = keys.len(), "mget");
        let encoded = self.store.mget(keys)?;
        Ok(encoded
            .iter()
            .map(|e| codec::decode(e.as_deref(), hint))
            .collect())
    }

    /// Delete keys. Returns how many existed.
    pub fn del(&self, keys: &[&str]) -> Result<usize> {
        trace!(keys = keys.len(), "del");
        self.store.del(keys)
    }

    /// Whether `key` exists.
    pub fn exists(&self, key: &str) -> Result<bool> {
        self.store.exists(key)
    }

    // =========================================================================
    // Keyspace metadata (text-only decode: store metadata is always textual)
    // =========================================================================

    /// All key names matching a glob pattern.
    pub fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let encoded = self.store.keys(pattern)?;
        Ok(encoded.iter().map(|k| codec::decode_key(k)).collect())
    }

    /// A random key name, or `None` when the store is empty.
    pub fn random_key(&self) -> Result<Option<String>> {
        let encoded = self.store.random_key()?;
        Ok(encoded.as_deref().map(codec::decode_key))
    }

    /// The type name stored at `key`, or `None` when the key is missing.
    pub fn type_of(&self, key: &str) -> Result<Option<String>> {
        let encoded = self.store.type_of(key)?;
        Ok(encoded.as_deref().map(codec::decode_key))
    }

    // =========================================================================
    // Hashes
    // =========================================================================

    /// Set one field of hash `key`. Returns whether the field was new.
    pub fn hset(&self, key: &str, field: &str, value: impl Into<Value>) -> Result<bool> {
        trace!(key, field, "hset");
        self.store.hset(key, field, codec::encode(&value.into())?)
    }

    /// Set several fields of hash `key` from a mapping. Field names stay
    /// untouched; an empty mapping is rejected with
    /// [`Error::InvalidArgument`]. Returns how many fields were new.
    pub fn hset_mapping(&self, key: &str, mapping: &HashMap<String, Value>) -> Result<usize> {
        if mapping.is_empty() {
            return Err(Error::InvalidArgument(
                "hset_mapping requires at least one field/value pair".to_owned(),
            ));
        }
        trace!(key, fields = mapping.len(), "hset_mapping");
        let pairs = codec::encode_pairs(mapping.iter().map(|(f, v)| (f.as_str(), v)))?;
        self.store.hset_multiple(key, pairs)
    }

    /// Get one field of hash `key`.
    pub fn hget(&self, key: &str, field: &str, hint: DecodeHint) -> Result<Option<Value>> {
        let encoded = self.store.hget(key, field)?;
        Ok(codec::decode(encoded.as_deref(), hint))
    }

    /// Get several fields of hash `key`, order-preservingly; missing fields
    /// decode to `None` in place.
    pub fn hmget(
        &self,
        key: &str,
        fields: &[&str],
        hint: DecodeHint,
    ) -> Result<Vec<Option<Value>>> {
        let encoded = self.store.hmget(key, fields)?;
        Ok(encoded
            .iter()
            .map(|e| codec::decode(e.as_deref(), hint))
            .collect())
    }

    /// All field names of hash `key`.
    pub fn hkeys(&self, key: &str) -> Result<Vec<String>> {
        let encoded = self.store.hkeys(key)?;
        Ok(encoded.iter().map(|f| codec::decode_key(f)).collect())
    }

    /// All values of hash `key`, each decoded independently.
    pub fn hvals(&self, key: &str, hint: DecodeHint) -> Result<Vec<Value>> {
        let encoded = self.store.hvals(key)?;
        Ok(encoded
            .iter()
            .filter_map(|v| codec::decode(Some(v), hint))
            .collect())
    }

    /// All field/value pairs of hash `key` as a native mapping.
    pub fn hgetall(&self, key: &str, hint: DecodeHint) -> Result<HashMap<String, Value>> {
        let encoded = self.store.hgetall(key)?;
        Ok(encoded
            .iter()
            .filter_map(|(f, v)| {
                codec::decode(Some(v), hint).map(|value| (codec::decode_key(f), value))
            })
            .collect())
    }

    // =========================================================================
    // Sets
    // =========================================================================

    /// Add members to set `key`. Returns how many were new.
    pub fn sadd(&self, key: &str, members: impl IntoIterator<Item = Value>) -> Result<usize> {
        let encoded = members
            .into_iter()
            .map(|m| codec::encode(&m))
            .collect::<Result<Vec<_>>>()?;
        trace!(key, members = encoded.len(), "sadd");
        self.store.sadd(key, encoded)
    }

    /// Remove members from set `key`. Returns how many were present.
    pub fn srem(&self, key: &str, members: impl IntoIterator<Item = Value>) -> Result<usize> {
        let encoded = members
            .into_iter()
            .map(|m| codec::encode(&m))
            .collect::<Result<Vec<_>>>()?;
        self.store.srem(key, encoded)
    }

    /// Whether `member` is in set `key`. Membership is tested on the encoded
    /// form, so it follows the same encoding as [`DirectClient::sadd`].
    pub fn sismember(&self, key: &str, member: &Value) -> Result<bool> {
        self.store.sismember(key, &codec::encode(member)?)
    }

    /// All members of set `key`, in no particular order, each decoded
    /// independently.
    pub fn smembers(&self, key: &str, hint: DecodeHint) -> Result<Vec<Value>> {
        let encoded = self.store.smembers(key)?;
        Ok(encoded
            .iter()
            .filter_map(|m| codec::decode(Some(m), hint))
            .collect())
    }

    /// Remove and return one random member of set `key`.
    pub fn spop(&self, key: &str, hint: DecodeHint) -> Result<Option<Value>> {
        let mut popped = self.store.spop(key, 1)?;
        Ok(popped.pop().and_then(|m| codec::decode(Some(&m), hint)))
    }

    /// Remove and return up to `count` random members of set `key`.
    pub fn spop_count(&self, key: &str, count: usize, hint: DecodeHint) -> Result<Vec<Value>> {
        let popped = self.store.spop(key, count)?;
        Ok(popped
            .iter()
            .filter_map(|m| codec::decode(Some(m), hint))
            .collect())
    }

    /// Return (without removing) one random member of set `key`.
    pub fn srandmember(&self, key: &str, hint: DecodeHint) -> Result<Option<Value>> {
        let mut chosen = self.store.srandmember(key, 1)?;
        Ok(chosen.pop().and_then(|m| codec::decode(Some(&m), hint)))
    }

    /// Return up to `count` distinct random members of set `key`.
    pub fn srandmember_count(
        &self,
        key: &str,
        count: usize,
        hint: DecodeHint,
    ) -> Result<Vec<Value>> {
        let chosen = self.store.srandmember(key, count)?;
        Ok(chosen
            .iter()
            .filter_map(|m| codec::decode(Some(m), hint))
            .collect())
    }

    /// Members of the first set not present in any of the others.
    pub fn sdiff(&self, keys: &[&str]) -> Result<Vec<Value>> {
        let encoded = self.store.sdiff(keys)?;
        Ok(encoded
            .iter()
            .filter_map(|m| codec::decode(Some(m), DecodeHint::TextFirst))
            .collect())
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// Push values onto the head of list `key`. Returns the new length.
    pub fn lpush(&self, key: &str, values: impl IntoIterator<Item = Value>) -> Result<usize> {
        let encoded = values
            .into_iter()
            .map(|v| codec::encode(&v))
            .collect::<Result<Vec<_>>>()?;
        trace!(key, values = encoded.len(), "lpush");
        self.store.lpush(key, encoded)
    }

    /// Push values onto the tail of list `key`. Returns the new length.
    pub fn rpush(&self, key: &str, values: impl IntoIterator<Item = Value>) -> Result<usize> {
        let encoded = values
            .into_iter()
            .map(|v| codec::encode(&v))
            .collect::<Result<Vec<_>>>()?;
        trace!(key, values = encoded.len(), "rpush");
        self.store.rpush(key, encoded)
    }

    /// Push onto the head only when the list exists. Returns the resulting
    /// length (0 when the list is absent).
    pub fn lpushx(&self, key: &str, value: impl Into<Value>) -> Result<usize> {
        self.store.lpushx(key, codec::encode(&value.into())?)
    }

    /// Push onto the tail only when the list exists. Returns the resulting
    /// length (0 when the list is absent).
    pub fn rpushx(&self, key: &str, value: impl Into<Value>) -> Result<usize> {
        self.store.rpushx(key, codec::encode(&value.into())?)
    }

    /// Remove and return the first item of list `key`.
    pub fn lpop(&self, key: &str, hint: DecodeHint) -> Result<Option<Value>> {
        let mut popped = self.store.lpop(key, 1)?;
        if popped.is_empty() {
            return Ok(None);
        }
        Ok(codec::decode(Some(&popped.remove(0)), hint))
    }

    /// Remove and return up to `count` items from the head of list `key`.
    pub fn lpop_count(&self, key: &str, count: usize, hint: DecodeHint) -> Result<Vec<Value>> {
        let popped = self.store.lpop(key, count)?;
        Ok(popped
            .iter()
            .filter_map(|v| codec::decode(Some(v), hint))
            .collect())
    }

    /// Remove and return the last item of list `key`.
    pub fn rpop(&self, key: &str, hint: DecodeHint) -> Result<Option<Value>> {
        let mut popped = self.store.rpop(key, 1)?;
        if popped.is_empty() {
            return Ok(None);
        }
        Ok(codec::decode(Some(&popped.remove(0)), hint))
    }

    /// Remove and return up to `count` items from the tail of list `key`.
    pub fn rpop_count(&self, key: &str, count: usize, hint: DecodeHint) -> Result<Vec<Value>> {
        let popped = self.store.rpop(key, count)?;
        Ok(popped
            .iter()
            .filter_map(|v| codec::decode(Some(v), hint))
            .collect())
    }

    /// The item of list `key` at `index` (negative indexes count from the
    /// tail).
    pub fn lindex(&self, key: &str, index: i64, hint: DecodeHint) -> Result<Option<Value>> {
        let encoded = self.store.lindex(key, index)?;
        Ok(codec::decode(encoded.as_deref(), hint))
    }

    /// The items of list `key` between `start` and `stop` inclusive (negative
    /// indexes count from the tail), each decoded independently and in order.
    pub fn lrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        hint: DecodeHint,
    ) -> Result<Vec<Value>> {
        let encoded = self.store.lrange(key, start, stop)?;
        Ok(encoded
            .iter()
            .filter_map(|v| codec::decode(Some(v), hint))
            .collect())
    }

    // =========================================================================
    // Tensors (explicit opt-in path, separate from the default codec)
    // =========================================================================

    /// Store a tensor at `key` in the packed numeric-array format.
    pub fn set_tensor(&self, key: &str, tensor: &Tensor) -> Result<bool> {
        trace!(key, "set_tensor");
        self.store.set(key, tensor.encode(), &SetOptions::new())
    }

    /// Fetch the tensor at `key`, or `None` when the key is missing.
    ///
    /// Fails with [`Error::InvalidTensor`] when the key holds bytes that are
    /// not a tensor encoding.
    pub fn get_tensor(&self, key: &str) -> Result<Option<Tensor>> {
        trace!(key, "get_tensor");
        match self.store.get(key)? {
            None => Ok(None),
            Some(bytes) => Ok(Some(Tensor::decode(&bytes)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn client() -> DirectClient<MemoryStore> {
        DirectClient::new(MemoryStore::new())
    }

    #[test]
    fn empty_mapping_is_invalid() {
        let c = client();
        let empty = HashMap::new();
        assert!(matches!(
            c.mset(&empty),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            c.hset_mapping("h", &empty),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn store_accessors() {
        let c = client();
        c.set("k", "v").unwrap();
        assert!(c.store().exists("k").unwrap());
        let store = c.into_store();
        assert!(store.exists("k").unwrap());
    }

    #[test]
    fn sismember_matches_encoded_form() {
        let c = client();
        c.sadd("s", vec![Value::Int(1), Value::from("one")]).unwrap();
        assert!(c.sismember("s", &Value::Int(1)).unwrap());
        assert!(c.sismember("s", &Value::from("one")).unwrap());
        assert!(!c.sismember("s", &Value::Int(2)).unwrap());
        // No coercion: the string "1" is not the integer 1.
        assert!(!c.sismember("s", &Value::from("1")).unwrap());
    }
}
