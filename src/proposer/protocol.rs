/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The two-phase quorum protocol run by the proposer for every `PUT` and `DELETE` command.
//!
//! A round for an [Operation] proceeds as follows:
//! 1. **Prepare**: a fresh [ProposalID] is generated, and `prepare` is called on every acceptor in turn.
//!    Promises are counted.
//! 2. **Accept**: only if more than half of all acceptors promised, `accept` is called on every acceptor
//!    in turn. Acceptances are counted.
//! 3. **Decide**: only if more than half of all acceptors accepted, `learn` is called on every learner,
//!    and then the operation is applied to the proposer's own store.
//!
//! A round that misses a quorum leaves the proposer's store untouched. How a round reacts to a peer that
//! cannot be reached is decided by the [TransportFailurePolicy].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crate::event_bus::EventHandlers;
use crate::events::*;
use crate::networking::{Network, TransportError};
use crate::state::KVStore;
use crate::types::basic::{AcceptResponse, NodeName, PrepareResponse, ProposalID};
use crate::types::operation::Operation;

use super::round_gate::{RoundGate, RoundSerialization};
use super::ProposeError;

/// What a round does when a `prepare`, `accept`, or `learn` call fails at the transport layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransportFailurePolicy {
    /// Abort the whole round and surface the failure to the client. Calls after the failed one are not
    /// made, and the proposer's store is not updated, even if the failure happened while broadcasting
    /// to learners.
    #[default]
    AbortRound,

    /// Treat the unreachable peer as if it had not voted, and carry on with the remaining peers. A
    /// learner that cannot be reached misses the decided operation.
    IsolateUnreachable,
}

/// How a round that ran to completion ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    /// A quorum accepted, and the operation was broadcast to the learners and applied locally.
    Decided { proposal: ProposalID },

    /// Too few acceptors promised. No `accept` calls were made.
    NoPromiseQuorum { proposal: ProposalID, promises: usize },

    /// Too few acceptors accepted. No `learn` calls were made.
    NoAcceptQuorum { proposal: ProposalID, acceptances: usize },
}

impl RoundOutcome {
    pub fn proposal(&self) -> ProposalID {
        match self {
            RoundOutcome::Decided { proposal }
            | RoundOutcome::NoPromiseQuorum { proposal, .. }
            | RoundOutcome::NoAcceptQuorum { proposal, .. } => *proposal,
        }
    }

    pub fn is_decided(&self) -> bool {
        matches!(self, RoundOutcome::Decided { .. })
    }
}

/// Whether `votes` out of `acceptors` is a strict majority, i.e., `votes > acceptors / 2` with integer
/// division.
pub fn is_quorum(votes: usize, acceptors: usize) -> bool {
    votes > acceptors / 2
}

/// The parameters of a proposer, derived from the cluster's [Configuration](crate::cluster::Configuration).
#[derive(Clone, Copy, Debug)]
pub struct ProposerConfiguration {
    pub call_timeout: Duration,
    pub transport_failure_policy: TransportFailurePolicy,
    pub round_serialization: RoundSerialization,
    pub worker_keep_alive: Duration,
}

/// The state shared by all workers running rounds for one proposer.
pub(crate) struct RoundRunner<N: Network> {
    config: ProposerConfiguration,
    network: N,
    acceptors: Vec<NodeName>,
    learners: Vec<NodeName>,
    store: KVStore,
    last_proposal: AtomicU64,
    gate: RoundGate,
    event_handlers: Option<Arc<EventHandlers>>,
}

impl<N: Network> RoundRunner<N> {
    pub(crate) fn new(
        config: ProposerConfiguration,
        network: N,
        acceptors: Vec<NodeName>,
        learners: Vec<NodeName>,
        event_handlers: Option<Arc<EventHandlers>>,
    ) -> Self {
        Self {
            gate: RoundGate::new(config.round_serialization),
            config,
            network,
            acceptors,
            learners,
            store: KVStore::new(),
            last_proposal: AtomicU64::new(0),
            event_handlers,
        }
    }

    pub(crate) fn store(&self) -> &KVStore {
        &self.store
    }

    pub(crate) fn last_proposal(&self) -> Option<ProposalID> {
        match self.last_proposal.load(Ordering::SeqCst) {
            0 => None,
            int => Some(ProposalID::new(int)),
        }
    }

    fn next_proposal(&self) -> ProposalID {
        ProposalID::new(self.last_proposal.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.config.call_timeout
    }

    /// Run one round of the protocol for `operation`.
    pub(crate) fn run(&self, operation: Operation) -> Result<RoundOutcome, ProposeError> {
        let _permit = self.gate.enter(operation.key());

        let proposal = self.next_proposal();
        Event::StartRound(StartRoundEvent {
            timestamp: SystemTime::now(),
            proposal,
            operation: operation.clone(),
        })
        .publish(&self.event_handlers);

        // 1. Prepare.
        let promises = self.prepare_phase(proposal)?;
        Event::CollectPromises(CollectPromisesEvent {
            timestamp: SystemTime::now(),
            proposal,
            promises,
            acceptors: self.acceptors.len(),
        })
        .publish(&self.event_handlers);

        if !is_quorum(promises, self.acceptors.len()) {
            return Ok(RoundOutcome::NoPromiseQuorum { proposal, promises });
        }

        // 2. Accept.
        let acceptances = self.accept_phase(proposal, &operation)?;
        Event::CollectAcceptances(CollectAcceptancesEvent {
            timestamp: SystemTime::now(),
            proposal,
            acceptances,
            acceptors: self.acceptors.len(),
        })
        .publish(&self.event_handlers);

        if !is_quorum(acceptances, self.acceptors.len()) {
            return Ok(RoundOutcome::NoAcceptQuorum {
                proposal,
                acceptances,
            });
        }

        // 3. Decide.
        self.decide(proposal, operation)?;
        Ok(RoundOutcome::Decided { proposal })
    }

    fn prepare_phase(&self, proposal: ProposalID) -> Result<usize, ProposeError> {
        let mut promises = 0;
        for acceptor in &self.acceptors {
            match self.network.prepare(acceptor, proposal, self.deadline()) {
                Ok(PrepareResponse::Promise) => promises += 1,
                Err(err) => self.on_transport_error(proposal, err)?,
            }
        }
        Ok(promises)
    }

    fn accept_phase(&self, proposal: ProposalID, operation: &Operation) -> Result<usize, ProposeError> {
        let mut acceptances = 0;
        for acceptor in &self.acceptors {
            match self.network.accept(acceptor, proposal, operation, self.deadline()) {
                Ok(AcceptResponse::Accepted) => acceptances += 1,
                Ok(AcceptResponse::Rejected) => {
                    log::debug!("{} rejected {}", acceptor, proposal)
                }
                Err(err) => self.on_transport_error(proposal, err)?,
            }
        }
        Ok(acceptances)
    }

    fn decide(&self, proposal: ProposalID, operation: Operation) -> Result<(), ProposeError> {
        for learner in &self.learners {
            if let Err(err) = self.network.learn(learner, &operation, self.deadline()) {
                self.on_transport_error(proposal, err)?;
            }
        }
        self.store.apply(&operation);

        Event::Decide(DecideEvent {
            timestamp: SystemTime::now(),
            proposal,
            operation,
        })
        .publish(&self.event_handlers);
        Ok(())
    }

    // Returns Ok if the round may carry on without the peer that could not be reached.
    fn on_transport_error(&self, proposal: ProposalID, error: TransportError) -> Result<(), ProposeError> {
        match self.config.transport_failure_policy {
            TransportFailurePolicy::AbortRound => {
                Event::AbortRound(AbortRoundEvent {
                    timestamp: SystemTime::now(),
                    proposal,
                    error: error.clone(),
                })
                .publish(&self.event_handlers);
                Err(ProposeError::Transport { proposal, error })
            }
            TransportFailurePolicy::IsolateUnreachable => {
                Event::SkipUnreachable(SkipUnreachableEvent {
                    timestamp: SystemTime::now(),
                    proposal,
                    error,
                })
                .publish(&self.event_handlers);
                Ok(())
            }
        }
    }
}
