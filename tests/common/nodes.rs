use std::{sync::Arc, time::Duration};

use paxos_rs::{
    acceptor::Acceptor,
    learner::Learner,
    networking::{LocalNetwork, NodeDirectory},
    proposer::{Proposer, ProposerConfiguration, RoundSerialization, TransportFailurePolicy},
    types::basic::{NodeName, Role},
};

use super::network::CountingNetwork;

/// Acceptors, learners, and a proposer wired together by hand over a [CountingNetwork], without a
/// cluster or event handlers.
pub(crate) struct Nodes {
    pub(crate) directory: Arc<NodeDirectory>,
    pub(crate) acceptors: Vec<Arc<Acceptor>>,
    pub(crate) learners: Vec<Arc<Learner>>,
    pub(crate) network: CountingNetwork<LocalNetwork>,
    pub(crate) proposer: Proposer<CountingNetwork<LocalNetwork>>,
}

impl Nodes {
    pub(crate) fn new(acceptors: usize, learners: usize, config: ProposerConfiguration) -> Nodes {
        let directory = Arc::new(NodeDirectory::new());
        directory.register(NodeName::proposer(), Role::Proposer).unwrap();

        let acceptors: Vec<Arc<Acceptor>> = (1..=acceptors)
            .map(|i| {
                directory.register(NodeName::acceptor(i), Role::Acceptor).unwrap();
                Arc::new(Acceptor::new(NodeName::acceptor(i)))
            })
            .collect();
        let learners: Vec<Arc<Learner>> = (1..=learners)
            .map(|i| {
                directory.register(NodeName::learner(i), Role::Learner).unwrap();
                Arc::new(Learner::new(NodeName::learner(i)))
            })
            .collect();

        let network = CountingNetwork::new(LocalNetwork::new(
            directory.clone(),
            acceptors.iter().cloned(),
            learners.iter().cloned(),
        ));
        let proposer = Proposer::new(
            config,
            network.clone(),
            acceptors.iter().map(|acceptor| acceptor.name().clone()).collect(),
            learners.iter().map(|learner| learner.name().clone()).collect(),
        );

        Nodes {
            directory,
            acceptors,
            learners,
            network,
            proposer,
        }
    }

    pub(crate) fn propose(&self, line: &str) -> String {
        let mut words = line.split(' ');
        let command = words.next().unwrap();
        let args: Vec<String> = words.map(str::to_string).collect();
        self.proposer.propose(command, &args).unwrap()
    }

    pub(crate) fn fail(&self, name: NodeName) {
        self.directory.mark_unavailable(&name).unwrap();
    }
}

pub(crate) fn config(policy: TransportFailurePolicy) -> ProposerConfiguration {
    ProposerConfiguration {
        call_timeout: Duration::from_secs(2),
        transport_failure_policy: policy,
        round_serialization: RoundSerialization::Relaxed,
        worker_keep_alive: Duration::from_secs(5),
    }
}
