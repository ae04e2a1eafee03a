/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A single-decree-per-command variant of Paxos that replicates `PUT` and `DELETE` updates to an
//! in-memory key-value store across a set of unreliable nodes.
//!
//! Nodes play one of three roles:
//! - The [Proposer](proposer::Proposer) turns each client command into one round of a two-phase quorum
//!   protocol, and keeps its own view of the store to serve `GET` commands.
//! - [Acceptors](acceptor::Acceptor) promise to consider proposals and accept operations under promised
//!   proposals.
//! - [Learners](learner::Learner) apply decided operations to their copy of the store.
//!
//! The roles talk to each other through the pluggable, synchronous [Network](networking::Network)
//! trait. A [failure simulator](failure_simulator) periodically makes random nodes unreachable and
//! brings them back.
//!
//! The quickest way to run every role in one process is to build and start a
//! [ClusterSpec](cluster::ClusterSpec).

pub mod acceptor;

pub mod client;

pub mod cluster;

pub mod events;

pub(crate) mod event_bus;

pub mod failure_simulator;

pub mod learner;

pub(crate) mod logging;

pub mod networking;

pub mod proposer;

pub mod state;

pub mod types;
