//! In-process implementation of [`RawStore`].
//!
//! One lock-guarded map of typed entries. Expiry is lazy: an expired string
//! entry reads as missing and is physically removed the next time a write
//! touches its key. Random-pick operations draw from a thread-local RNG.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use parking_lot::RwLock;
use rand::seq::IteratorRandom;

use super::{RawStore, SetOptions};
use crate::error::{Error, Result};

/// One stored entry. Keys are typed: string, hash, set, or list, and an
/// operation for one type fails on a key holding another.
#[derive(Debug)]
enum Entry {
    Str {
        data: Vec<u8>,
        expires_at: Option<Instant>,
    },
    Hash(HashMap<String, Vec<u8>>),
    Set(HashSet<Vec<u8>>),
    List(VecDeque<Vec<u8>>),
}

impl Entry {
    fn type_name(&self) -> &'static str {
        match self {
            Entry::Str { .. } => "string",
            Entry::Hash(_) => "hash",
            Entry::Set(_) => "set",
            Entry::List(_) => "list",
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        matches!(self, Entry::Str { expires_at: Some(at), .. } if *at <= now)
    }
}

fn wrong_type(expected: &str, entry: &Entry) -> Error {
    Error::WrongType {
        expected: expected.to_owned(),
        actual: entry.type_name().to_owned(),
    }
}

/// Drop the entry at `key` if it has expired, so writes do not resurrect or
/// collide with stale state.
fn prune_expired(entries: &mut HashMap<String, Entry>, key: &str) {
    let now = Instant::now();
    if entries.get(key).is_some_and(|e| e.is_expired(now)) {
        entries.remove(key);
    }
}

/// Read access that treats expired entries as absent.
fn live<'a>(entries: &'a HashMap<String, Entry>, key: &str) -> Option<&'a Entry> {
    entries.get(key).filter(|e| !e.is_expired(Instant::now()))
}

/// Write access that removes an expired entry before handing out the slot.
fn live_mut<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    prune_expired(entries, key);
    entries.get_mut(key)
}

/// Glob match supporting `*` (any run) and `?` (any one character).
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;
    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(s) = star {
            // Backtrack: let the last `*` absorb one more character.
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

/// Normalize a possibly negative index against `len`. Out-of-range indexes
/// return `None`.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let idx = if index < 0 {
        index.checked_add(len as i64)?
    } else {
        index
    };
    if idx < 0 || idx as usize >= len {
        None
    } else {
        Some(idx as usize)
    }
}

/// In-memory store with Redis-style typed keys.
///
/// Thread-safe behind a single reader/writer lock; suitable for tests and for
/// embedding the decorator without a network store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    /// Whether the store holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl RawStore for MemoryStore {
    fn set(&self, key: &str, value: Vec<u8>, options: &SetOptions) -> Result<bool> {
        let mut entries = self.entries.write();
        prune_expired(&mut entries, key);
        let present = entries.contains_key(key);
        if (options.if_not_exists && present) || (options.if_exists && !present) {
            return Ok(false);
        }
        let expires_at = options.ttl.map(|ttl| Instant::now() + ttl);
        entries.insert(
            key.to_owned(),
            Entry::Str {
                data: value,
                expires_at,
            },
        );
        Ok(true)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read();
        match live(&entries, key) {
            None => Ok(None),
            Some(Entry::Str { data, .. }) => Ok(Some(data.clone())),
            Some(other) => Err(wrong_type("string", other)),
        }
    }

    fn mset(&self, pairs: Vec<(String, Vec<u8>)>) -> Result<()> {
        let mut entries = self.entries.write();
        for (key, value) in pairs {
            entries.insert(
                key,
                Entry::Str {
                    data: value,
                    expires_at: None,
                },
            );
        }
        Ok(())
    }

    fn mget(&self, keys: &[&str]) -> Result<Vec<Option<Vec<u8>>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    fn del(&self, keys: &[&str]) -> Result<usize> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let mut removed = 0;
        for key in keys {
            if let Some(e) = entries.remove(*key) {
                if !e.is_expired(now) {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        let entries = self.entries.read();
        Ok(entries.get(key).is_some_and(|e| !e.is_expired(now)))
    }

    fn keys(&self, pattern: &str) -> Result<Vec<Vec<u8>>> {
        let now = Instant::now();
        let entries = self.entries.read();
        Ok(entries
            .iter()
            .filter(|(name, e)| !e.is_expired(now) && glob_match(pattern, name))
            .map(|(name, _)| name.clone().into_bytes())
            .collect())
    }

    fn random_key(&self) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let entries = self.entries.read();
        let mut rng = rand::thread_rng();
        Ok(entries
            .iter()
            .filter(|(_, e)| !e.is_expired(now))
            .map(|(name, _)| name)
            .choose(&mut rng)
            .map(|name| name.clone().into_bytes()))
    }

    fn type_of(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let entries = self.entries.read();
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.type_name().as_bytes().to_vec()))
    }

    fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<bool> {
        let mut entries = self.entries.write();
        prune_expired(&mut entries, key);
        let entry = entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::Hash(HashMap::new()));
        match entry {
            Entry::Hash(hash) => Ok(hash.insert(field.to_owned(), value).is_none()),
            other => Err(wrong_type("hash", other)),
        }
    }

    fn hset_multiple(&self, key: &str, pairs: Vec<(String, Vec<u8>)>) -> Result<usize> {
        // Zero fields must not create the key.
        if pairs.is_empty() {
            return Ok(0);
        }
        let mut entries = self.entries.write();
        prune_expired(&mut entries, key);
        let entry = entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::Hash(HashMap::new()));
        match entry {
            Entry::Hash(hash) => {
                let mut added = 0;
                for (field, value) in pairs {
                    if hash.insert(field, value).is_none() {
                        added += 1;
                    }
                }
                Ok(added)
            }
            other => Err(wrong_type("hash", other)),
        }
    }

    fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read();
        match live(&entries, key) {
            None => Ok(None),
            Some(Entry::Hash(hash)) => Ok(hash.get(field).cloned()),
            Some(other) => Err(wrong_type("hash", other)),
        }
    }

    fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<Vec<u8>>>> {
        let entries = self.entries.read();
        match live(&entries, key) {
            None => Ok(vec![None; fields.len()]),
            Some(Entry::Hash(hash)) => {
                Ok(fields.iter().map(|f| hash.get(*f).cloned()).collect())
            }
            Some(other) => Err(wrong_type("hash", other)),
        }
    }

    fn hkeys(&self, key: &str) -> Result<Vec<Vec<u8>>> {
        let entries = self.entries.read();
        match live(&entries, key) {
            None => Ok(Vec::new()),
            Some(Entry::Hash(hash)) => {
                Ok(hash.keys().map(|f| f.clone().into_bytes()).collect())
            }
            Some(other) => Err(wrong_type("hash", other)),
        }
    }

    fn hvals(&self, key: &str) -> Result<Vec<Vec<u8>>> {
        let entries = self.entries.read();
        match live(&entries, key) {
            None => Ok(Vec::new()),
            Some(Entry::Hash(hash)) => Ok(hash.values().cloned().collect()),
            Some(other) => Err(wrong_type("hash", other)),
        }
    }

    fn hgetall(&self, key: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let entries = self.entries.read();
        match live(&entries, key) {
            None => Ok(Vec::new()),
            Some(Entry::Hash(hash)) => Ok(hash
                .iter()
                .map(|(f, v)| (f.clone().into_bytes(), v.clone()))
                .collect()),
            Some(other) => Err(wrong_type("hash", other)),
        }
    }

    fn sadd(&self, key: &str, members: Vec<Vec<u8>>) -> Result<usize> {
        // Zero members must not create the key.
        if members.is_empty() {
            return Ok(0);
        }
        let mut entries = self.entries.write();
        prune_expired(&mut entries, key);
        let entry = entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::Set(HashSet::new()));
        match entry {
            Entry::Set(set) => {
                let mut added = 0;
                for member in members {
                    if set.insert(member) {
                        added += 1;
                    }
                }
                Ok(added)
            }
            other => Err(wrong_type("set", other)),
        }
    }

    fn srem(&self, key: &str, members: Vec<Vec<u8>>) -> Result<usize> {
        let mut entries = self.entries.write();
        let removed = match live_mut(&mut entries, key) {
            None => 0,
            Some(Entry::Set(set)) => {
                members.iter().filter(|m| set.remove(m.as_slice())).count()
            }
            Some(other) => return Err(wrong_type("set", other)),
        };
        if matches!(entries.get(key), Some(Entry::Set(s)) if s.is_empty()) {
            entries.remove(key);
        }
        Ok(removed)
    }

    fn sismember(&self, key: &str, member: &[u8]) -> Result<bool> {
        let entries = self.entries.read();
        match live(&entries, key) {
            None => Ok(false),
            Some(Entry::Set(set)) => Ok(set.contains(member)),
            Some(other) => Err(wrong_type("set", other)),
        }
    }

    fn smembers(&self, key: &str) -> Result<Vec<Vec<u8>>> {
        let entries = self.entries.read();
        match live(&entries, key) {
            None => Ok(Vec::new()),
            Some(Entry::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(other) => Err(wrong_type("set", other)),
        }
    }

    fn spop(&self, key: &str, count: usize) -> Result<Vec<Vec<u8>>> {
        let mut entries = self.entries.write();
        let popped = match live_mut(&mut entries, key) {
            None => Vec::new(),
            Some(Entry::Set(set)) => {
                let mut rng = rand::thread_rng();
                let chosen: Vec<Vec<u8>> =
                    set.iter().cloned().choose_multiple(&mut rng, count);
                for member in &chosen {
                    set.remove(member.as_slice());
                }
                chosen
            }
            Some(other) => return Err(wrong_type("set", other)),
        };
        if matches!(entries.get(key), Some(Entry::Set(s)) if s.is_empty()) {
            entries.remove(key);
        }
        Ok(popped)
    }

    fn srandmember(&self, key: &str, count: usize) -> Result<Vec<Vec<u8>>> {
        let entries = self.entries.read();
        match live(&entries, key) {
            None => Ok(Vec::new()),
            Some(Entry::Set(set)) => {
                let mut rng = rand::thread_rng();
                Ok(set.iter().cloned().choose_multiple(&mut rng, count))
            }
            Some(other) => Err(wrong_type("set", other)),
        }
    }

    fn sdiff(&self, keys: &[&str]) -> Result<Vec<Vec<u8>>> {
        let entries = self.entries.read();
        let mut result: HashSet<Vec<u8>> = match keys.first().map(|k| live(&entries, k)) {
            None | Some(None) => return Ok(Vec::new()),
            Some(Some(Entry::Set(set))) => set.clone(),
            Some(Some(other)) => return Err(wrong_type("set", other)),
        };
        for key in &keys[1..] {
            match live(&entries, key) {
                None => {}
                Some(Entry::Set(set)) => result.retain(|m| !set.contains(m)),
                Some(other) => return Err(wrong_type("set", other)),
            }
        }
        Ok(result.into_iter().collect())
    }

    fn lpush(&self, key: &str, values: Vec<Vec<u8>>) -> Result<usize> {
        // Zero values must not create the key; report the current length.
        if values.is_empty() {
            let entries = self.entries.read();
            return Ok(match live(&entries, key) {
                Some(Entry::List(list)) => list.len(),
                _ => 0,
            });
        }
        let mut entries = self.entries.write();
        prune_expired(&mut entries, key);
        let entry = entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::List(VecDeque::new()));
        match entry {
            Entry::List(list) => {
                for value in values {
                    list.push_front(value);
                }
                Ok(list.len())
            }
            other => Err(wrong_type("list", other)),
        }
    }

    fn rpush(&self, key: &str, values: Vec<Vec<u8>>) -> Result<usize> {
        // Zero values must not create the key; report the current length.
        if values.is_empty() {
            let entries = self.entries.read();
            return Ok(match live(&entries, key) {
                Some(Entry::List(list)) => list.len(),
                _ => 0,
            });
        }
        let mut entries = self.entries.write();
        prune_expired(&mut entries, key);
        let entry = entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::List(VecDeque::new()));
        match entry {
            Entry::List(list) => {
                for value in values {
                    list.push_back(value);
                }
                Ok(list.len())
            }
            other => Err(wrong_type("list", other)),
        }
    }

    fn lpushx(&self, key: &str, value: Vec<u8>) -> Result<usize> {
        let mut entries = self.entries.write();
        match live_mut(&mut entries, key) {
            None => Ok(0),
            Some(Entry::List(list)) => {
                list.push_front(value);
                Ok(list.len())
            }
            Some(other) => Err(wrong_type("list", other)),
        }
    }

    fn rpushx(&self, key: &str, value: Vec<u8>) -> Result<usize> {
        let mut entries = self.entries.write();
        match live_mut(&mut entries, key) {
            None => Ok(0),
            Some(Entry::List(list)) => {
                list.push_back(value);
                Ok(list.len())
            }
            Some(other) => Err(wrong_type("list", other)),
        }
    }

    fn lpop(&self, key: &str, count: usize) -> Result<Vec<Vec<u8>>> {
        let mut entries = self.entries.write();
        let popped = match live_mut(&mut entries, key) {
            None => Vec::new(),
            Some(Entry::List(list)) => {
                let take = count.min(list.len());
                list.drain(..take).collect()
            }
            Some(other) => return Err(wrong_type("list", other)),
        };
        if matches!(entries.get(key), Some(Entry::List(l)) if l.is_empty()) {
            entries.remove(key);
        }
        Ok(popped)
    }

    fn rpop(&self, key: &str, count: usize) -> Result<Vec<Vec<u8>>> {
        let mut entries = self.entries.write();
        let popped = match live_mut(&mut entries, key) {
            None => Vec::new(),
            Some(Entry::List(list)) => {
                let take = count.min(list.len());
                let mut out = Vec::with_capacity(take);
                for _ in 0..take {
                    if let Some(value) = list.pop_back() {
                        out.push(value);
                    }
                }
                out
            }
            Some(other) => return Err(wrong_type("list", other)),
        };
        if matches!(entries.get(key), Some(Entry::List(l)) if l.is_empty()) {
            entries.remove(key);
        }
        Ok(popped)
    }

    fn lindex(&self, key: &str, index: i64) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read();
        match live(&entries, key) {
            None => Ok(None),
            Some(Entry::List(list)) => Ok(normalize_index(index, list.len())
                .and_then(|i| list.get(i))
                .cloned()),
            Some(other) => Err(wrong_type("list", other)),
        }
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        let entries = self.entries.read();
        match live(&entries, key) {
            None => Ok(Vec::new()),
            Some(Entry::List(list)) => {
                let len = list.len() as i64;
                let mut lo = if start < 0 { start + len } else { start };
                let mut hi = if stop < 0 { stop + len } else { stop };
                lo = lo.max(0);
                hi = hi.min(len - 1);
                if lo > hi || lo >= len {
                    return Ok(Vec::new());
                }
                Ok(list
                    .iter()
                    .skip(lo as usize)
                    .take((hi - lo + 1) as usize)
                    .cloned()
                    .collect())
            }
            Some(other) => Err(wrong_type("list", other)),
        }
    }
}
