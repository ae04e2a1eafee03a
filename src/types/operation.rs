/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The [Operation] that rounds decide on, and the [Command]s that clients send to the proposer.
//!
//! ## Encodings
//!
//! Operations have two encodings:
//! 1. A structured [borsh](https://docs.rs/borsh) encoding ([Operation::to_bytes] and [Operation::from_bytes]).
//!    This is what crosses the [Network](crate::networking::Network), and since it is length-prefixed,
//!    keys and values may contain any characters, including spaces.
//! 2. A space-delimited text form, `"PUT <key> <value>"` or `"DELETE <key>"`, produced by [Display]. This
//!    is only used for logging.

use borsh::{BorshDeserialize, BorshSerialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};

/// A state-changing command on the replicated key-value store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub enum Operation {
    Put { key: String, value: String },
    Delete { key: String },
}

impl Operation {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Operation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Operation::Delete { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            Operation::Put { key, .. } => key,
            Operation::Delete { key } => key,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        // Serializing into a Vec cannot fail.
        self.try_to_vec().unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, std::io::Error> {
        Self::try_from_slice(bytes)
    }

    /// SHA-256 digest of the borsh encoding. Used to identify operations compactly in logs.
    pub fn digest(&self) -> [u8; 32] {
        Sha256::digest(self.to_bytes()).into()
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Put { key, value } => write!(f, "PUT {} {}", key, value),
            Operation::Delete { key } => write!(f, "DELETE {}", key),
        }
    }
}

/// The commands a client can ask the proposer to execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Get,
    Put,
    Delete,
}

impl Command {
    /// Parses a command name. Names are matched exactly (`"GET"`, `"PUT"`, `"DELETE"`).
    pub fn parse(name: &str) -> Option<Command> {
        match name {
            "GET" => Some(Command::Get),
            "PUT" => Some(Command::Put),
            "DELETE" => Some(Command::Delete),
            _ => None,
        }
    }

    /// The hint returned to clients that call this command with too few arguments.
    pub fn usage(&self) -> &'static str {
        match self {
            Command::Get => "Example Usage: GET <key>",
            Command::Put => "Example Usage: PUT <key> <value>",
            Command::Delete => "Example Usage: DELETE <key>",
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Command::Get => f.write_str("GET"),
            Command::Put => f.write_str("PUT"),
            Command::Delete => f.write_str("DELETE"),
        }
    }
}
