/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The [NodeDirectory]: the registry of every node in a cluster, keyed by stable name, and of whether
//! each node is currently reachable.
//!
//! Registering a node binds its name. Marking it unavailable removes the binding without forgetting the
//! node, so that restoring it later makes the same in-memory instance reachable again, with all of its
//! state intact.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::types::basic::{NodeName, Role};

use super::network::{Rpc, TransportError};

#[derive(Clone, Copy, Debug)]
struct NodeEntry {
    role: Role,
    available: bool,
}

#[derive(Default)]
pub struct NodeDirectory {
    nodes: RwLock<BTreeMap<NodeName, NodeEntry>>,
}

impl NodeDirectory {
    pub fn new() -> NodeDirectory {
        NodeDirectory::default()
    }

    /// Bind `name` to a node with the given `role`. Newly registered nodes are available.
    pub fn register(&self, name: NodeName, role: Role) -> Result<(), DirectoryError> {
        let mut nodes = self.write();
        if nodes.contains_key(&name) {
            return Err(DirectoryError::AlreadyRegistered(name));
        }
        nodes.insert(name, NodeEntry { role, available: true });
        Ok(())
    }

    /// Make calls to `name` fail at the transport layer until it is [restored](Self::restore).
    ///
    /// Returns whether the node was available before this call.
    pub fn mark_unavailable(&self, name: &NodeName) -> Result<bool, DirectoryError> {
        self.set_available(name, false)
    }

    /// Make `name` reachable again. Restoring a node that is already available is a no-op rebind.
    ///
    /// Returns whether the node was unavailable before this call.
    pub fn restore(&self, name: &NodeName) -> Result<bool, DirectoryError> {
        self.set_available(name, true).map(|was_available| !was_available)
    }

    fn set_available(&self, name: &NodeName, available: bool) -> Result<bool, DirectoryError> {
        let mut nodes = self.write();
        let entry = nodes
            .get_mut(name)
            .ok_or_else(|| DirectoryError::UnknownNode(name.clone()))?;
        let was_available = entry.available;
        entry.available = available;
        Ok(was_available)
    }

    pub fn is_available(&self, name: &NodeName) -> bool {
        self.read().get(name).map_or(false, |entry| entry.available)
    }

    pub fn role(&self, name: &NodeName) -> Option<Role> {
        self.read().get(name).map(|entry| entry.role)
    }

    /// Check that a call of kind `rpc` can be delivered to `name`, returning the role of the node.
    pub fn resolve(&self, name: &NodeName, rpc: Rpc) -> Result<Role, TransportError> {
        match self.read().get(name) {
            Some(NodeEntry { role, available: true }) => Ok(*role),
            Some(NodeEntry { available: false, .. }) => Err(TransportError::Unavailable {
                node: name.clone(),
                rpc,
            }),
            None => Err(TransportError::UnknownNode {
                node: name.clone(),
                rpc,
            }),
        }
    }

    /// The names of all registered nodes, in order.
    pub fn names(&self) -> Vec<NodeName> {
        self.read().keys().cloned().collect()
    }

    /// The names of all registered nodes that are currently unavailable, in order.
    pub fn unavailable(&self) -> Vec<NodeName> {
        self.read()
            .iter()
            .filter(|(_, entry)| !entry.available)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<NodeName, NodeEntry>> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<NodeName, NodeEntry>> {
        self.nodes.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectoryError {
    AlreadyRegistered(NodeName),
    UnknownNode(NodeName),
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryError::AlreadyRegistered(name) => write!(f, "{} is already registered", name),
            DirectoryError::UnknownNode(name) => write!(f, "no node is registered as {}", name),
        }
    }
}

impl std::error::Error for DirectoryError {}
