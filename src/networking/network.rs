/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

use std::fmt::{self, Display, Formatter};
use std::time::Instant;

use crate::types::basic::{AcceptResponse, NodeName, PrepareResponse, ProposalID};
use crate::types::operation::Operation;

/// Blocking remote calls from the proposer to acceptors and learners.
///
/// Every call carries a `deadline`. Implementations must return by the deadline, failing with
/// [TransportError::Timeout] if the peer has not answered by then. A call to a peer that is not
/// currently reachable must fail with a [TransportError], never with a protocol response such as
/// [AcceptResponse::Rejected].
pub trait Network: Clone + Send + Sync + 'static {
    /// Ask `acceptor` to promise to consider `proposal`.
    fn prepare(
        &self,
        acceptor: &NodeName,
        proposal: ProposalID,
        deadline: Instant,
    ) -> Result<PrepareResponse, TransportError>;

    /// Ask `acceptor` to accept `operation` under `proposal`.
    fn accept(
        &self,
        acceptor: &NodeName,
        proposal: ProposalID,
        operation: &Operation,
        deadline: Instant,
    ) -> Result<AcceptResponse, TransportError>;

    /// Tell `learner` that `operation` has been decided.
    fn learn(
        &self,
        learner: &NodeName,
        operation: &Operation,
        deadline: Instant,
    ) -> Result<(), TransportError>;
}

/// The remote operations exposed by the roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rpc {
    Propose,
    Prepare,
    Accept,
    Learn,
}

impl Display for Rpc {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Rpc::Propose => f.write_str("propose"),
            Rpc::Prepare => f.write_str("prepare"),
            Rpc::Accept => f.write_str("accept"),
            Rpc::Learn => f.write_str("learn"),
        }
    }
}

/// A remote call could not be delivered, or its answer did not arrive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// The node is registered, but is currently unavailable.
    Unavailable { node: NodeName, rpc: Rpc },

    /// No node is registered under this name.
    UnknownNode { node: NodeName, rpc: Rpc },

    /// The node did not answer before the call's deadline.
    Timeout { node: NodeName, rpc: Rpc },

    /// The request could not be decoded by the receiving node.
    Codec { node: NodeName, rpc: Rpc, reason: String },
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Unavailable { node, rpc } => {
                write!(f, "{} on {} failed: node is unavailable", rpc, node)
            }
            TransportError::UnknownNode { node, rpc } => {
                write!(f, "{} on {} failed: no node is bound to this name", rpc, node)
            }
            TransportError::Timeout { node, rpc } => {
                write!(f, "{} on {} failed: deadline exceeded", rpc, node)
            }
            TransportError::Codec { node, rpc, reason } => {
                write!(f, "{} on {} failed: malformed request ({})", rpc, node, reason)
            }
        }
    }
}

impl std::error::Error for TransportError {}
