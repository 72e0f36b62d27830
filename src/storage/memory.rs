//! In-process store
//!
//! Suitable for development and tests. Every connection shares the same
//! data, and the store keeps count of how many connections were opened and
//! released.

use super::{ConnectionProvider, StoreConnection, Write};
use crate::errors::StoreError;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Data {
    hashes: HashMap<String, BTreeMap<String, String>>,
    lists: HashMap<String, VecDeque<String>>,
    sets: HashMap<String, BTreeSet<String>>,
}

impl Data {
    fn contains(&self, key: &str) -> bool {
        self.hashes.contains_key(key) || self.lists.contains_key(key) || self.sets.contains_key(key)
    }

    fn apply(&mut self, write: &Write) {
        match write {
            Write::SetHash { key, fields } => {
                self.hashes
                    .entry(key.clone())
                    .or_default()
                    .extend(fields.iter().cloned());
            }
            Write::AddToSet { key, member } => {
                self.sets.entry(key.clone()).or_default().insert(member.clone());
            }
            Write::PushList { key, value } => {
                self.lists.entry(key.clone()).or_default().push_front(value.clone());
            }
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    released: AtomicUsize,
}

/// Shared in-memory key/value store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<Data>>,
    counters: Arc<Counters>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection to the store.
    pub fn connection(&self) -> MemoryConnection {
        self.counters.opened.fetch_add(1, Ordering::AcqRel);
        MemoryConnection {
            data: self.data.clone(),
            counters: self.counters.clone(),
        }
    }

    /// Number of connections opened so far.
    pub fn opened_connections(&self) -> usize {
        self.counters.opened.load(Ordering::Acquire)
    }

    /// Number of connections released so far.
    pub fn released_connections(&self) -> usize {
        self.counters.released.load(Ordering::Acquire)
    }
}

impl ConnectionProvider for MemoryStore {
    type Connection = MemoryConnection;

    fn get_connection(&self) -> Result<MemoryConnection, StoreError> {
        Ok(self.connection())
    }
}

/// Connection to a [`MemoryStore`]. Released on drop.
#[derive(Debug)]
pub struct MemoryConnection {
    data: Arc<Mutex<Data>>,
    counters: Arc<Counters>,
}

impl MemoryConnection {
    fn lock(&self) -> Result<MutexGuard<'_, Data>, StoreError> {
        self.data.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl StoreConnection for MemoryConnection {
    fn commit_if_absent(&mut self, guard_key: &str, writes: &[Write]) -> Result<bool, StoreError> {
        let mut data = self.lock()?;
        if data.contains(guard_key) {
            return Ok(false);
        }

        for write in writes {
            data.apply(write);
        }
        Ok(true)
    }

    fn get_hash(&mut self, key: &str) -> Result<BTreeMap<String, String>, StoreError> {
        Ok(self.lock()?.hashes.get(key).cloned().unwrap_or_default())
    }

    fn get_list(&mut self, key: &str) -> Result<Vec<String>, StoreError> {
        let data = self.lock()?;
        Ok(data
            .lists
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn get_set(&mut self, key: &str) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.lock()?.sets.get(key).cloned().unwrap_or_default())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::AcqRel);
    }
}
