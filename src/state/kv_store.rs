/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines the [KVStore], the string-to-string mapping that decided [operations](Operation) are applied to.
//!
//! Each [Learner](crate::learner::Learner) owns one copy of the store, and the
//! [Proposer](crate::proposer::Proposer) owns another, which it uses to serve `GET` commands. The copies
//! converge because they apply the same decided operations.
//!
//! The store is only guarded by its own lock: concurrent `apply`s and `get`s are safe, but are not
//! otherwise ordered relative to each other.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::types::operation::Operation;

/// A volatile, in-memory key-value store. Cloning a `KVStore` returns another handle to the same
/// underlying map.
#[derive(Clone, Default)]
pub struct KVStore(Arc<RwLock<HashMap<String, String>>>);

impl KVStore {
    /// Create a new, empty `KVStore`.
    pub fn new() -> KVStore {
        KVStore::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read().get(key).cloned()
    }

    /// Apply a decided operation. `Put` inserts or overwrites, `Delete` removes the key if it is
    /// present. Both are idempotent, so applying the same operation twice leaves the store as applying
    /// it once would.
    pub fn apply(&self, operation: &Operation) {
        let mut map = self.write();
        match operation {
            Operation::Put { key, value } => {
                map.insert(key.clone(), value.clone());
            }
            Operation::Delete { key } => {
                map.remove(key);
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy the current contents of the store into an ordered map.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.read()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    // `apply` never leaves the map half-updated, so a poisoned lock still guards a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}
