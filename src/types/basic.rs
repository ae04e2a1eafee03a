/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! "Inert" types that are passed between the roles and inspected, but have no active behavior. These
//! types follow the newtype pattern and the API for using them is defined in this module.

use borsh::{BorshDeserialize, BorshSerialize};
use std::fmt::{self, Debug, Display, Formatter};

/// Identifier of a single consensus round, generated by the [Proposer](crate::proposer::Proposer).
///
/// Identifiers are strictly increasing within the lifetime of one proposer, so no two rounds of the same
/// proposer share an identifier and any two identifiers of the same proposer are totally ordered. They
/// are *not* unique across proposers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize)]
pub struct ProposalID(u64);

impl ProposalID {
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u64 {
        self.0
    }
}

impl Display for ProposalID {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PROPOSAL-{}", self.0)
    }
}

impl Debug for ProposalID {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// Stable name that a node is bound to in the [NodeDirectory](crate::networking::NodeDirectory),
/// e.g. `"Proposer"`, `"Acceptor1"`, or `"Learner3"`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize)]
pub struct NodeName(String);

impl NodeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name the single proposer of a cluster is bound to.
    pub fn proposer() -> Self {
        Self::new("Proposer")
    }

    /// The name of the acceptor with the given 1-based index.
    pub fn acceptor(index: usize) -> Self {
        Self(format!("Acceptor{}", index))
    }

    /// The name of the learner with the given 1-based index.
    pub fn learner(index: usize) -> Self {
        Self(format!("Learner{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for NodeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl From<&str> for NodeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// The role played by a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Proposer,
    Acceptor,
    Learner,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Role::Proposer => f.write_str("Proposer"),
            Role::Acceptor => f.write_str("Acceptor"),
            Role::Learner => f.write_str("Learner"),
        }
    }
}

/// An acceptor's answer to a `prepare` call. Acceptors never refuse to promise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub enum PrepareResponse {
    Promise,
}

impl Display for PrepareResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PrepareResponse::Promise => f.write_str("PROMISE"),
        }
    }
}

/// An acceptor's answer to an `accept` call.
///
/// `Rejected` is an ordinary protocol outcome (the proposal was never promised), and is distinct from
/// the acceptor being unreachable, which is reported as a [TransportError](crate::networking::TransportError).
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub enum AcceptResponse {
    Accepted,
    Rejected,
}

impl Display for AcceptResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AcceptResponse::Accepted => f.write_str("ACCEPTED"),
            AcceptResponse::Rejected => f.write_str("REJECTED"),
        }
    }
}
