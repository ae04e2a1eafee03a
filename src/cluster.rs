/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Methods to build and start a cluster of nodes running in one process.
//!
//! A cluster consists of one proposer, `N` acceptors, and `M` learners, all registered in a shared
//! [NodeDirectory] under their stable names (`"Proposer"`, `"Acceptor1"` to `"AcceptorN"`, and
//! `"Learner1"` to `"LearnerM"`), and connected by a [LocalNetwork]. A [failure
//! simulator](crate::failure_simulator) can optionally be started against the directory.
//!
//! ## Starting a cluster
//!
//! ```ignore
//! let cluster =
//!     ClusterSpec::builder()
//!     .acceptors(3)
//!     .learners(3)
//!     .configuration(configuration)
//!     .failure_simulator(FailureSimulatorConfig::default())
//!     .on_decide(decide_handler)
//!     .build()
//!     .start()?;
//!
//! let response = cluster.client().submit("PUT key1 value1")?;
//! ```
//!
//! ### Optional setters
//!
//! Every setter of [ClusterSpec] is optional. The `on_*` setters register user-defined event handlers
//! for events from [crate::events]:
//! - `.on_receive_command(...)`
//! - `.on_start_round(...)`
//! - `.on_collect_promises(...)`
//! - `.on_collect_acceptances(...)`
//! - `.on_decide(...)`
//! - `.on_skip_unreachable(...)`
//! - `.on_abort_round(...)`
//! - `.on_receive_prepare(...)`
//! - `.on_receive_accept(...)`
//! - `.on_learn(...)`
//! - `.on_node_fail(...)`
//! - `.on_node_restart(...)`
//!
//! The cluster's [configuration](Configuration) can also be defined using the builder pattern, for
//! example:
//!
//! ```ignore
//! let configuration =
//!     Configuration::builder()
//!     .call_timeout(Duration::from_secs(2))
//!     .transport_failure_policy(TransportFailurePolicy::IsolateUnreachable)
//!     .round_serialization(RoundSerialization::PerKey)
//!     .log_events(true)
//!     .build();
//! ```

use std::sync::Arc;
use std::time::Duration;

use typed_builder::TypedBuilder;

use crate::acceptor::Acceptor;
use crate::client::Client;
use crate::event_bus::*;
use crate::events::*;
use crate::failure_simulator::{FailureSimulator, FailureSimulatorConfig};
use crate::learner::Learner;
use crate::networking::{DirectoryError, LocalNetwork, NodeDirectory};
use crate::proposer::{Proposer, ProposerConfiguration, RoundSerialization, TransportFailurePolicy};
use crate::types::basic::{NodeName, Role};

/// Stores the user-defined parameters of the proposer and of event logging, that is:
/// 1. The call timeout, which bounds how long the proposer waits for any single `prepare`, `accept`, or
///    `learn` call.
/// 2. The [transport failure policy](TransportFailurePolicy), which decides whether a round survives
///    unreachable peers.
/// 3. The [round serialization](RoundSerialization), which decides whether concurrent rounds may race.
/// 4. The worker keep-alive period, after which idle proposer workers exit.
/// 5. The "Log Events" flag. If set to "true", every event is logged by the default loggers.
///
/// ## Log Events
///
/// paxos_rs logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages printed
/// onto a terminal or to a file, set up a [logging
/// implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
#[derive(Clone, Debug, TypedBuilder)]
#[builder(builder_method(doc =
    "
    Create a builder for building a [Configuration]. On the builder call the following methods to construct a valid [Configuration].

    Optional:
    - `.call_timeout(...)`
    - `.transport_failure_policy(...)`
    - `.round_serialization(...)`
    - `.worker_keep_alive(...)`
    - `.log_events(...)`
"
))]
pub struct Configuration {
    #[builder(default = Duration::from_secs(2), setter(doc = "Set the maximum time the proposer waits for a single remote call. Optional, defaults to 2 seconds."))]
    pub call_timeout: Duration,
    #[builder(default, setter(doc = "Set what a round does when a peer cannot be reached. Optional, defaults to aborting the round."))]
    pub transport_failure_policy: TransportFailurePolicy,
    #[builder(default, setter(doc = "Set how concurrent rounds are ordered. Optional, defaults to fully concurrent rounds."))]
    pub round_serialization: RoundSerialization,
    #[builder(default = Duration::from_secs(60), setter(doc = "Set how long an idle proposer worker lives. Optional, defaults to 60 seconds."))]
    pub worker_keep_alive: Duration,
    #[builder(default = true, setter(doc = "Enable logging? Optional, defaults to true."))]
    pub log_events: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::builder().build()
    }
}

impl From<&Configuration> for ProposerConfiguration {
    fn from(configuration: &Configuration) -> Self {
        ProposerConfiguration {
            call_timeout: configuration.call_timeout,
            transport_failure_policy: configuration.transport_failure_policy,
            round_serialization: configuration.round_serialization,
            worker_keep_alive: configuration.worker_keep_alive,
        }
    }
}

/// Stores all parameters required to start a [Cluster].
#[derive(TypedBuilder)]
#[builder(builder_method(doc =
    "
    Create a builder for building a [ClusterSpec]. On the builder call the following methods to construct a valid [ClusterSpec].

    Optional:
    - `.acceptors(...)`
    - `.learners(...)`
    - `.configuration(...)`
    - `.failure_simulator(...)`
    - `.network_latency(...)`
    - `.on_receive_command(...)`
    - `.on_start_round(...)`
    - `.on_collect_promises(...)`
    - `.on_collect_acceptances(...)`
    - `.on_decide(...)`
    - `.on_skip_unreachable(...)`
    - `.on_abort_round(...)`
    - `.on_receive_prepare(...)`
    - `.on_receive_accept(...)`
    - `.on_learn(...)`
    - `.on_node_fail(...)`
    - `.on_node_restart(...)`
"
))]
pub struct ClusterSpec {
    #[builder(default = 3, setter(doc = "Set the number of acceptors. Optional, defaults to 3."))]
    acceptors: usize,
    #[builder(default = 3, setter(doc = "Set the number of learners. Optional, defaults to 3."))]
    learners: usize,
    #[builder(default, setter(doc = "Set the [configuration](Configuration) of the proposer and of event logging. Optional."))]
    configuration: Configuration,
    #[builder(default, setter(strip_option, doc = "Start a [failure simulator](crate::failure_simulator) with the given schedule. Optional, no failures are injected by default."))]
    failure_simulator: Option<FailureSimulatorConfig>,
    #[builder(default, setter(doc = "Set the simulated latency of every remote call. Optional, defaults to zero."))]
    network_latency: Duration,
    #[builder(default, setter(transform = |handler: impl Fn(&ReceiveCommandEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<ReceiveCommandEvent>),
    doc = "Register a handler closure to be invoked after the proposer receives a command. Optional."))]
    on_receive_command: Option<HandlerPtr<ReceiveCommandEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&StartRoundEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<StartRoundEvent>),
    doc = "Register a handler closure to be invoked after the proposer starts a round. Optional."))]
    on_start_round: Option<HandlerPtr<StartRoundEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&CollectPromisesEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<CollectPromisesEvent>),
    doc = "Register a handler closure to be invoked after the prepare phase of a round completes. Optional."))]
    on_collect_promises: Option<HandlerPtr<CollectPromisesEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&CollectAcceptancesEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<CollectAcceptancesEvent>),
    doc = "Register a handler closure to be invoked after the accept phase of a round completes. Optional."))]
    on_collect_acceptances: Option<HandlerPtr<CollectAcceptancesEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&DecideEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<DecideEvent>),
    doc = "Register a handler closure to be invoked after an operation is decided and applied to the proposer's store. Optional."))]
    on_decide: Option<HandlerPtr<DecideEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&SkipUnreachableEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<SkipUnreachableEvent>),
    doc = "Register a handler closure to be invoked after a round skips a peer that could not be reached. Optional."))]
    on_skip_unreachable: Option<HandlerPtr<SkipUnreachableEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&AbortRoundEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<AbortRoundEvent>),
    doc = "Register a handler closure to be invoked after a round is aborted by a transport failure. Optional."))]
    on_abort_round: Option<HandlerPtr<AbortRoundEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ReceivePrepareEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<ReceivePrepareEvent>),
    doc = "Register a handler closure to be invoked after an acceptor receives a prepare call. Optional."))]
    on_receive_prepare: Option<HandlerPtr<ReceivePrepareEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ReceiveAcceptEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<ReceiveAcceptEvent>),
    doc = "Register a handler closure to be invoked after an acceptor answers an accept call. Optional."))]
    on_receive_accept: Option<HandlerPtr<ReceiveAcceptEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&LearnEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<LearnEvent>),
    doc = "Register a handler closure to be invoked after a learner applies a decided operation. Optional."))]
    on_learn: Option<HandlerPtr<LearnEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&NodeFailEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<NodeFailEvent>),
    doc = "Register a handler closure to be invoked after the failure simulator marks a node unavailable. Optional."))]
    on_node_fail: Option<HandlerPtr<NodeFailEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&NodeRestartEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<NodeRestartEvent>),
    doc = "Register a handler closure to be invoked after the failure simulator restores a node. Optional."))]
    on_node_restart: Option<HandlerPtr<NodeRestartEvent>>,
}

impl ClusterSpec {
    /// Registers every node in a fresh directory, wires the nodes together, and starts the failure
    /// simulator if one was configured.
    pub fn start(self) -> Result<Cluster, DirectoryError> {
        let user_handlers = EventHandlers {
            receive_command_handlers: self.on_receive_command.into_iter().collect(),
            start_round_handlers: self.on_start_round.into_iter().collect(),
            collect_promises_handlers: self.on_collect_promises.into_iter().collect(),
            collect_acceptances_handlers: self.on_collect_acceptances.into_iter().collect(),
            decide_handlers: self.on_decide.into_iter().collect(),
            skip_unreachable_handlers: self.on_skip_unreachable.into_iter().collect(),
            abort_round_handlers: self.on_abort_round.into_iter().collect(),
            receive_prepare_handlers: self.on_receive_prepare.into_iter().collect(),
            receive_accept_handlers: self.on_receive_accept.into_iter().collect(),
            learn_handlers: self.on_learn.into_iter().collect(),
            node_fail_handlers: self.on_node_fail.into_iter().collect(),
            node_restart_handlers: self.on_node_restart.into_iter().collect(),
        };
        let event_handlers = EventHandlers::new(self.configuration.log_events, user_handlers);
        let event_handlers = if event_handlers.is_empty() {
            None
        } else {
            Some(Arc::new(event_handlers))
        };

        let directory = Arc::new(NodeDirectory::new());
        directory.register(NodeName::proposer(), Role::Proposer)?;

        let mut acceptors = Vec::with_capacity(self.acceptors);
        for i in 1..=self.acceptors {
            let name = NodeName::acceptor(i);
            directory.register(name.clone(), Role::Acceptor)?;
            acceptors.push(Arc::new(Acceptor::with_event_handlers(name, event_handlers.clone())));
        }

        let mut learners = Vec::with_capacity(self.learners);
        for i in 1..=self.learners {
            let name = NodeName::learner(i);
            directory.register(name.clone(), Role::Learner)?;
            learners.push(Arc::new(Learner::with_event_handlers(name, event_handlers.clone())));
        }

        let network = LocalNetwork::new(
            Arc::clone(&directory),
            acceptors.iter().cloned(),
            learners.iter().cloned(),
        )
        .with_latency(self.network_latency);

        let proposer = Arc::new(Proposer::with_event_handlers(
            ProposerConfiguration::from(&self.configuration),
            network,
            acceptors.iter().map(|acceptor| acceptor.name().clone()).collect(),
            learners.iter().map(|learner| learner.name().clone()).collect(),
            event_handlers.clone(),
        ));

        let failure_simulator = self.failure_simulator.map(|config| {
            FailureSimulator::with_event_handlers(config, Arc::clone(&directory), event_handlers)
        });

        log::info!(
            "Started a cluster with {} acceptors and {} learners",
            acceptors.len(),
            learners.len()
        );

        Ok(Cluster {
            directory,
            acceptors,
            learners,
            proposer,
            failure_simulator,
        })
    }
}

/// A handle to the nodes of a running cluster. When this value is dropped, the failure simulator, if
/// any, is stopped.
pub struct Cluster {
    directory: Arc<NodeDirectory>,
    acceptors: Vec<Arc<Acceptor>>,
    learners: Vec<Arc<Learner>>,
    proposer: Arc<Proposer<LocalNetwork>>,
    failure_simulator: Option<FailureSimulator>,
}

impl Cluster {
    pub fn directory(&self) -> &Arc<NodeDirectory> {
        &self.directory
    }

    pub fn acceptors(&self) -> &[Arc<Acceptor>] {
        &self.acceptors
    }

    pub fn learners(&self) -> &[Arc<Learner>] {
        &self.learners
    }

    pub fn proposer(&self) -> &Arc<Proposer<LocalNetwork>> {
        &self.proposer
    }

    /// A client that reaches this cluster's proposer through the directory.
    pub fn client(&self) -> Client<LocalNetwork> {
        Client::new(Arc::clone(&self.directory), Arc::clone(&self.proposer))
    }

    pub fn failure_simulator(&self) -> Option<&FailureSimulator> {
        self.failure_simulator.as_ref()
    }
}
