/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The [Learner] role: applies decided operations to its own copy of the key-value store.
//!
//! Learners do not protect against duplicate or out-of-order delivery. Duplicates are harmless since
//! `PUT` and `DELETE` are idempotent on a mapping.

use std::sync::Arc;
use std::time::SystemTime;

use crate::event_bus::EventHandlers;
use crate::events::{Event, LearnEvent};
use crate::state::KVStore;
use crate::types::basic::NodeName;
use crate::types::operation::Operation;

pub struct Learner {
    name: NodeName,
    store: KVStore,
    event_handlers: Option<Arc<EventHandlers>>,
}

impl Learner {
    /// Create a learner with a fresh, empty store.
    pub fn new(name: NodeName) -> Learner {
        Learner::with_store(name, KVStore::new())
    }

    /// Create a learner that applies decided operations to `store`.
    pub fn with_store(name: NodeName, store: KVStore) -> Learner {
        Learner {
            name,
            store,
            event_handlers: None,
        }
    }

    pub(crate) fn with_event_handlers(
        name: NodeName,
        event_handlers: Option<Arc<EventHandlers>>,
    ) -> Learner {
        Learner {
            name,
            store: KVStore::new(),
            event_handlers,
        }
    }

    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Apply a decided operation to this learner's store.
    pub fn learn(&self, operation: Operation) {
        self.store.apply(&operation);

        Event::Learn(LearnEvent {
            timestamp: SystemTime::now(),
            learner: self.name.clone(),
            operation,
        })
        .publish(&self.event_handlers);
    }

    /// A handle to this learner's store.
    pub fn store(&self) -> &KVStore {
        &self.store
    }
}
