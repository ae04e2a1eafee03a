/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The [Client]: submits command lines to the proposer of a cluster.
//!
//! The proposer is looked up in the [NodeDirectory] by name before every command, so a client fails
//! with a [TransportError] while the failure simulator holds the proposer down.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use crate::networking::{Network, NodeDirectory, Rpc, TransportError};
use crate::proposer::{ProposeError, Proposer};
use crate::types::basic::NodeName;

/// The command lines sent by [Client::prepopulate], in order.
pub const DEMO_COMMANDS: [&str; 15] = [
    "PUT key1 value1",
    "PUT key2 value2",
    "PUT key3 value3",
    "PUT key4 value4",
    "PUT key5 value5",
    "GET key1",
    "GET key2",
    "GET key3",
    "GET key4",
    "GET key5",
    "DELETE key1",
    "DELETE key2",
    "DELETE key3",
    "DELETE key4",
    "DELETE key5",
];

pub struct Client<N: Network> {
    directory: Arc<NodeDirectory>,
    proposer_name: NodeName,
    proposer: Arc<Proposer<N>>,
}

impl<N: Network> Client<N> {
    pub fn new(directory: Arc<NodeDirectory>, proposer: Arc<Proposer<N>>) -> Client<N> {
        Client {
            directory,
            proposer_name: NodeName::proposer(),
            proposer,
        }
    }

    /// Send `command` with `args` to the proposer, and return its result string.
    pub fn propose(&self, command: &str, args: &[String]) -> Result<String, ClientError> {
        self.directory.resolve(&self.proposer_name, Rpc::Propose)?;
        Ok(self.proposer.propose(command, args)?)
    }

    /// Parse a command line of the form `COMMAND [key [value...]]` and send it to the proposer.
    ///
    /// The command and the key may be separated by any number of spaces. The key and the value are
    /// separated by a single space, and everything after it is passed on as the value, inner spaces
    /// included.
    pub fn submit(&self, line: &str) -> Result<String, ClientError> {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let args: Vec<String> = rest
            .trim_start_matches(' ')
            .splitn(2, ' ')
            .filter(|arg| !arg.is_empty())
            .map(str::to_string)
            .collect();
        self.propose(command, &args)
    }

    /// Send every command in [DEMO_COMMANDS], logging each response. A failed command is logged and
    /// does not stop the sequence.
    ///
    /// Returns the outcome of each command, in order.
    pub fn prepopulate(&self) -> Vec<Result<String, ClientError>> {
        DEMO_COMMANDS
            .iter()
            .map(|line| {
                let result = self.submit(line);
                match &result {
                    Ok(response) => log::info!("{} -> {}", line, response),
                    Err(err) => log::warn!("{} -> {}", line, err),
                }
                result
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The proposer could not be reached.
    Transport(TransportError),
    /// The proposer was reached, but could not complete the command.
    Propose(ProposeError),
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(err) => write!(f, "could not reach the proposer: {}", err),
            ClientError::Propose(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<TransportError> for ClientError {
    fn from(value: TransportError) -> Self {
        ClientError::Transport(value)
    }
}

impl From<ProposeError> for ClientError {
    fn from(value: ProposeError) -> Self {
        ClientError::Propose(value)
    }
}
