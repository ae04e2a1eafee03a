use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use paxos_rs::{
    networking::{Network, Rpc, TransportError},
    types::{
        basic::{AcceptResponse, NodeName, PrepareResponse, ProposalID},
        operation::Operation,
    },
};

/// A network wrapper that records every call made through it before forwarding it to the wrapped
/// network.
#[derive(Clone)]
pub(crate) struct CountingNetwork<N: Network> {
    inner: N,
    calls: Arc<Mutex<Vec<(Rpc, NodeName)>>>,
}

impl<N: Network> CountingNetwork<N> {
    pub(crate) fn new(inner: N) -> CountingNetwork<N> {
        CountingNetwork {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(Rpc, NodeName)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, rpc: Rpc) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| *called == rpc)
            .count()
    }

    pub(crate) fn reset(&self) {
        self.calls.lock().unwrap().clear()
    }

    fn record(&self, rpc: Rpc, node: &NodeName) {
        self.calls.lock().unwrap().push((rpc, node.clone()))
    }
}

impl<N: Network> Network for CountingNetwork<N> {
    fn prepare(
        &self,
        acceptor: &NodeName,
        proposal: ProposalID,
        deadline: Instant,
    ) -> Result<PrepareResponse, TransportError> {
        self.record(Rpc::Prepare, acceptor);
        self.inner.prepare(acceptor, proposal, deadline)
    }

    fn accept(
        &self,
        acceptor: &NodeName,
        proposal: ProposalID,
        operation: &Operation,
        deadline: Instant,
    ) -> Result<AcceptResponse, TransportError> {
        self.record(Rpc::Accept, acceptor);
        self.inner.accept(acceptor, proposal, operation, deadline)
    }

    fn learn(
        &self,
        learner: &NodeName,
        operation: &Operation,
        deadline: Instant,
    ) -> Result<(), TransportError> {
        self.record(Rpc::Learn, learner);
        self.inner.learn(learner, operation, deadline)
    }
}
