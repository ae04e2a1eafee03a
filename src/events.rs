/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions of the events emitted by the proposer, acceptors, learners, and the failure simulator,
//! for event handling and logging.
//!
//! Note: an event for a given action indicates that the action has been completed.

use std::sync::Arc;
use std::time::SystemTime;

use crate::event_bus::EventHandlers;
use crate::networking::TransportError;
use crate::types::basic::{AcceptResponse, NodeName, ProposalID};
use crate::types::operation::Operation;

pub enum Event {
    // Proposer events.
    ReceiveCommand(ReceiveCommandEvent),
    StartRound(StartRoundEvent),
    CollectPromises(CollectPromisesEvent),
    CollectAcceptances(CollectAcceptancesEvent),
    Decide(DecideEvent),
    SkipUnreachable(SkipUnreachableEvent),
    AbortRound(AbortRoundEvent),
    // Acceptor and learner events.
    ReceivePrepare(ReceivePrepareEvent),
    ReceiveAccept(ReceiveAcceptEvent),
    Learn(LearnEvent),
    // Failure simulator events.
    NodeFail(NodeFailEvent),
    NodeRestart(NodeRestartEvent),
}

impl Event {
    pub(crate) fn publish(self, event_handlers: &Option<Arc<EventHandlers>>) {
        if let Some(event_handlers) = event_handlers {
            event_handlers.fire_handlers(self)
        }
    }
}

/// The proposer received a command from a client.
pub struct ReceiveCommandEvent {
    pub timestamp: SystemTime,
    pub command: String,
    pub args: Vec<String>,
}

/// The proposer generated a fresh proposal ID for an operation and is about to broadcast `prepare`.
pub struct StartRoundEvent {
    pub timestamp: SystemTime,
    pub proposal: ProposalID,
    pub operation: Operation,
}

/// The prepare phase of a round completed.
pub struct CollectPromisesEvent {
    pub timestamp: SystemTime,
    pub proposal: ProposalID,
    pub promises: usize,
    pub acceptors: usize,
}

/// The accept phase of a round completed.
pub struct CollectAcceptancesEvent {
    pub timestamp: SystemTime,
    pub proposal: ProposalID,
    pub acceptances: usize,
    pub acceptors: usize,
}

/// The operation was broadcast to the learners and applied to the proposer's store.
pub struct DecideEvent {
    pub timestamp: SystemTime,
    pub proposal: ProposalID,
    pub operation: Operation,
}

/// A peer could not be reached, and the round carried on without it.
pub struct SkipUnreachableEvent {
    pub timestamp: SystemTime,
    pub proposal: ProposalID,
    pub error: TransportError,
}

/// A peer could not be reached, and the round was aborted.
pub struct AbortRoundEvent {
    pub timestamp: SystemTime,
    pub proposal: ProposalID,
    pub error: TransportError,
}

pub struct ReceivePrepareEvent {
    pub timestamp: SystemTime,
    pub acceptor: NodeName,
    pub proposal: ProposalID,
}

pub struct ReceiveAcceptEvent {
    pub timestamp: SystemTime,
    pub acceptor: NodeName,
    pub proposal: ProposalID,
    pub operation: Operation,
    pub response: AcceptResponse,
}

pub struct LearnEvent {
    pub timestamp: SystemTime,
    pub learner: NodeName,
    pub operation: Operation,
}

/// The failure simulator made a node unavailable.
pub struct NodeFailEvent {
    pub timestamp: SystemTime,
    pub node: NodeName,
}

/// The failure simulator made a node available again.
pub struct NodeRestartEvent {
    pub timestamp: SystemTime,
    pub node: NodeName,
}
