/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The single point at which concurrent rounds can be serialized.
//!
//! Acceptors track promises per proposal ID instead of enforcing "highest proposal wins", so two rounds
//! running concurrently for the same key can both be decided, and whichever applies last determines the
//! final value. [RoundSerialization] selects whether this race is allowed.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// How rounds started concurrently by the same proposer are ordered relative to each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RoundSerialization {
    /// Rounds run fully concurrently. Concurrent rounds on the same key race.
    #[default]
    Relaxed,

    /// At most one round is in flight at any time.
    Global,

    /// At most one round per key is in flight at any time.
    PerKey,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Slot {
    All,
    Key(String),
}

pub(crate) struct RoundGate {
    serialization: RoundSerialization,
    occupied: Mutex<HashSet<Slot>>,
    released: Condvar,
}

impl RoundGate {
    pub(crate) fn new(serialization: RoundSerialization) -> RoundGate {
        RoundGate {
            serialization,
            occupied: Mutex::new(HashSet::new()),
            released: Condvar::new(),
        }
    }

    /// Block until a round on `key` may run. The round may run for as long as the returned permit is
    /// alive.
    pub(crate) fn enter(&self, key: &str) -> RoundPermit<'_> {
        let slot = match self.serialization {
            RoundSerialization::Relaxed => return RoundPermit { gate: self, slot: None },
            RoundSerialization::Global => Slot::All,
            RoundSerialization::PerKey => Slot::Key(key.to_string()),
        };

        let mut occupied = self.occupied();
        while occupied.contains(&slot) {
            occupied = self
                .released
                .wait(occupied)
                .unwrap_or_else(PoisonError::into_inner);
        }
        occupied.insert(slot.clone());

        RoundPermit {
            gate: self,
            slot: Some(slot),
        }
    }

    fn occupied(&self) -> MutexGuard<'_, HashSet<Slot>> {
        self.occupied.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) struct RoundPermit<'a> {
    gate: &'a RoundGate,
    slot: Option<Slot>,
}

impl Drop for RoundPermit<'_> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.gate.occupied().remove(&slot);
            self.gate.released.notify_all();
        }
    }
}
