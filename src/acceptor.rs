/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The [Acceptor] role: a promise and acceptance state machine.
//!
//! An acceptor keeps two records:
//! 1. The set of proposal IDs it has promised to consider, grown by [Acceptor::prepare].
//! 2. The operations it has accepted, keyed by proposal ID, grown by [Acceptor::accept].
//!
//! A proposal ID can only acquire an acceptance if it was promised first. Acceptors never refuse to
//! promise, and rejection is computed from the records rather than stored. Records are never pruned:
//! they live as long as the acceptor does.
//!
//! Each record is independently thread-safe, but nothing locks both records across a whole round.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use crate::event_bus::EventHandlers;
use crate::events::{Event, ReceiveAcceptEvent, ReceivePrepareEvent};
use crate::types::basic::{AcceptResponse, NodeName, PrepareResponse, ProposalID};
use crate::types::operation::Operation;

pub struct Acceptor {
    name: NodeName,
    promises: Mutex<HashSet<ProposalID>>,
    accepted: Mutex<HashMap<ProposalID, Operation>>,
    event_handlers: Option<Arc<EventHandlers>>,
}

impl Acceptor {
    pub fn new(name: NodeName) -> Acceptor {
        Acceptor::with_event_handlers(name, None)
    }

    pub(crate) fn with_event_handlers(
        name: NodeName,
        event_handlers: Option<Arc<EventHandlers>>,
    ) -> Acceptor {
        Acceptor {
            name,
            promises: Mutex::new(HashSet::new()),
            accepted: Mutex::new(HashMap::new()),
            event_handlers,
        }
    }

    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Promise to consider `proposal`. Always answers [PrepareResponse::Promise].
    ///
    /// Preparing a proposal that is already promised or accepted does not change any state.
    pub fn prepare(&self, proposal: ProposalID) -> PrepareResponse {
        if !lock(&self.accepted).contains_key(&proposal) {
            lock(&self.promises).insert(proposal);
        }

        Event::ReceivePrepare(ReceivePrepareEvent {
            timestamp: SystemTime::now(),
            acceptor: self.name.clone(),
            proposal,
        })
        .publish(&self.event_handlers);

        PrepareResponse::Promise
    }

    /// Accept `operation` under `proposal` if `proposal` was previously promised. Otherwise, answer
    /// [AcceptResponse::Rejected] without changing any state.
    ///
    /// Accepting again under the same proposal ID replaces the previously accepted operation.
    pub fn accept(&self, proposal: ProposalID, operation: Operation) -> AcceptResponse {
        let response = if lock(&self.promises).contains(&proposal) {
            lock(&self.accepted).insert(proposal, operation.clone());
            AcceptResponse::Accepted
        } else {
            AcceptResponse::Rejected
        };

        Event::ReceiveAccept(ReceiveAcceptEvent {
            timestamp: SystemTime::now(),
            acceptor: self.name.clone(),
            proposal,
            operation,
            response,
        })
        .publish(&self.event_handlers);

        response
    }

    pub fn is_promised(&self, proposal: ProposalID) -> bool {
        lock(&self.promises).contains(&proposal)
    }

    pub fn accepted_operation(&self, proposal: ProposalID) -> Option<Operation> {
        lock(&self.accepted).get(&proposal).cloned()
    }

    pub fn promise_count(&self) -> usize {
        lock(&self.promises).len()
    }

    pub fn acceptance_count(&self) -> usize {
        lock(&self.accepted).len()
    }
}

// Both records are updated with single insertions, so a poisoned lock still guards a consistent record.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
