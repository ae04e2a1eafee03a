/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Pluggable, synchronous remote calls between the roles.
//!
//! The [Network] trait is the boundary to the remote-call transport. The proposer only ever reaches
//! acceptors and learners through it, addressing them by their [NodeName](crate::types::basic::NodeName).
//! Which names are reachable at a given moment is tracked by the [NodeDirectory], which is shared with
//! the [failure simulator](crate::failure_simulator).
//!
//! [LocalNetwork] is an in-process implementation of [Network] that dispatches calls to node instances
//! living in the same process.

pub mod network;
pub use network::{Network, Rpc, TransportError};

pub mod directory;
pub use directory::{DirectoryError, NodeDirectory};

pub mod local;
pub use local::LocalNetwork;
