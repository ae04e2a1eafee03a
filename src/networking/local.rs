/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! [LocalNetwork]: an in-process [Network] that delivers calls to acceptors and learners living in the
//! same process.
//!
//! Before a call is delivered, the target is [resolved](NodeDirectory::resolve) in the shared
//! directory, so nodes marked unavailable by the failure simulator fail with
//! [TransportError::Unavailable]. Operations cross the network in their borsh encoding and are decoded
//! by the receiving side.
//!
//! An optional per-call latency can be configured. A call whose latency would carry it past its
//! deadline waits until the deadline and then fails with [TransportError::Timeout].

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::acceptor::Acceptor;
use crate::learner::Learner;
use crate::types::basic::{AcceptResponse, NodeName, PrepareResponse, ProposalID};
use crate::types::operation::Operation;

use super::directory::NodeDirectory;
use super::network::{Network, Rpc, TransportError};

#[derive(Clone)]
pub struct LocalNetwork {
    directory: Arc<NodeDirectory>,
    acceptors: Arc<HashMap<NodeName, Arc<Acceptor>>>,
    learners: Arc<HashMap<NodeName, Arc<Learner>>>,
    latency: Duration,
}

impl LocalNetwork {
    pub fn new(
        directory: Arc<NodeDirectory>,
        acceptors: impl IntoIterator<Item = Arc<Acceptor>>,
        learners: impl IntoIterator<Item = Arc<Learner>>,
    ) -> LocalNetwork {
        LocalNetwork {
            directory,
            acceptors: Arc::new(
                acceptors
                    .into_iter()
                    .map(|acceptor| (acceptor.name().clone(), acceptor))
                    .collect(),
            ),
            learners: Arc::new(
                learners
                    .into_iter()
                    .map(|learner| (learner.name().clone(), learner))
                    .collect(),
            ),
            latency: Duration::ZERO,
        }
    }

    /// Delay the delivery of every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> LocalNetwork {
        self.latency = latency;
        self
    }

    pub fn directory(&self) -> &Arc<NodeDirectory> {
        &self.directory
    }

    // Resolve the target, then simulate the time it takes for the call to reach it.
    fn deliver(&self, node: &NodeName, rpc: Rpc, deadline: Instant) -> Result<(), TransportError> {
        self.directory.resolve(node, rpc)?;

        let now = Instant::now();
        if now + self.latency > deadline {
            thread::sleep(deadline.saturating_duration_since(now));
            return Err(TransportError::Timeout {
                node: node.clone(),
                rpc,
            });
        }
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        Ok(())
    }

    fn acceptor(&self, node: &NodeName, rpc: Rpc) -> Result<&Arc<Acceptor>, TransportError> {
        self.acceptors
            .get(node)
            .ok_or_else(|| TransportError::UnknownNode {
                node: node.clone(),
                rpc,
            })
    }

    fn learner(&self, node: &NodeName, rpc: Rpc) -> Result<&Arc<Learner>, TransportError> {
        self.learners
            .get(node)
            .ok_or_else(|| TransportError::UnknownNode {
                node: node.clone(),
                rpc,
            })
    }
}

impl Network for LocalNetwork {
    fn prepare(
        &self,
        acceptor: &NodeName,
        proposal: ProposalID,
        deadline: Instant,
    ) -> Result<PrepareResponse, TransportError> {
        let rpc = Rpc::Prepare;
        let target = self.acceptor(acceptor, rpc)?;
        self.deliver(acceptor, rpc, deadline)?;
        Ok(target.prepare(proposal))
    }

    fn accept(
        &self,
        acceptor: &NodeName,
        proposal: ProposalID,
        operation: &Operation,
        deadline: Instant,
    ) -> Result<AcceptResponse, TransportError> {
        let rpc = Rpc::Accept;
        let target = self.acceptor(acceptor, rpc)?;
        let request = operation.to_bytes();
        self.deliver(acceptor, rpc, deadline)?;
        let operation = decode(&request, acceptor, rpc)?;
        Ok(target.accept(proposal, operation))
    }

    fn learn(
        &self,
        learner: &NodeName,
        operation: &Operation,
        deadline: Instant,
    ) -> Result<(), TransportError> {
        let rpc = Rpc::Learn;
        let target = self.learner(learner, rpc)?;
        let request = operation.to_bytes();
        self.deliver(learner, rpc, deadline)?;
        let operation = decode(&request, learner, rpc)?;
        target.learn(operation);
        Ok(())
    }
}

fn decode(request: &[u8], node: &NodeName, rpc: Rpc) -> Result<Operation, TransportError> {
    Operation::from_bytes(request).map_err(|err| TransportError::Codec {
        node: node.clone(),
        rpc,
        reason: err.to_string(),
    })
}
