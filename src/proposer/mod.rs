/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The [Proposer] role: accepts client commands and drives them through the quorum protocol.
//!
//! `GET` commands are served from the proposer's own view of the store, without contacting any acceptor
//! or learner. `PUT` and `DELETE` commands each run one round of the [protocol]. Every command runs as an
//! independent job on a worker pool that grows with demand, and the caller blocks until the job returns
//! its result string.
//!
//! ## Result strings
//!
//! | Situation                                  | Result                                      |
//! |--------------------------------------------|---------------------------------------------|
//! | Unknown command                            | `Invalid Command. (Use: GET/PUT/DELETE)`    |
//! | Missing arguments                          | The command's [usage](Command::usage) hint  |
//! | `GET` of a key in the proposer's view      | The value                                   |
//! | `GET` of a key not in the proposer's view  | `No record found.`                          |
//! | Round decided                              | `Operation successful.`                     |
//! | Round missed a quorum                      | `Operation failed.`                         |
//!
//! A round aborted by a transport failure returns [ProposeError::Transport] instead of a result string.

pub mod protocol;

pub mod round_gate;

pub(crate) mod worker_pool;

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use std::time::SystemTime;

use crate::event_bus::EventHandlers;
use crate::events::{Event, ReceiveCommandEvent};
use crate::networking::{Network, TransportError};
use crate::state::KVStore;
use crate::types::basic::{NodeName, ProposalID};
use crate::types::operation::{Command, Operation};

use protocol::RoundRunner;
use worker_pool::{WorkerLost, WorkerPool};

pub use protocol::{is_quorum, ProposerConfiguration, RoundOutcome, TransportFailurePolicy};
pub use round_gate::RoundSerialization;

pub const INVALID_COMMAND: &str = "Invalid Command. (Use: GET/PUT/DELETE)";
pub const NO_RECORD_FOUND: &str = "No record found.";
pub const OPERATION_SUCCESSFUL: &str = "Operation successful.";
pub const OPERATION_FAILED: &str = "Operation failed.";

pub struct Proposer<N: Network> {
    runner: Arc<RoundRunner<N>>,
    pool: WorkerPool,
    event_handlers: Option<Arc<EventHandlers>>,
}

impl<N: Network> Proposer<N> {
    /// Create a proposer that runs rounds against `acceptors` and broadcasts decided operations to
    /// `learners`, all reached through `network`.
    pub fn new(
        config: ProposerConfiguration,
        network: N,
        acceptors: Vec<NodeName>,
        learners: Vec<NodeName>,
    ) -> Proposer<N> {
        Proposer::with_event_handlers(config, network, acceptors, learners, None)
    }

    pub(crate) fn with_event_handlers(
        config: ProposerConfiguration,
        network: N,
        acceptors: Vec<NodeName>,
        learners: Vec<NodeName>,
        event_handlers: Option<Arc<EventHandlers>>,
    ) -> Proposer<N> {
        Proposer {
            runner: Arc::new(RoundRunner::new(
                config,
                network,
                acceptors,
                learners,
                event_handlers.clone(),
            )),
            pool: WorkerPool::new(config.worker_keep_alive),
            event_handlers,
        }
    }

    /// Execute a client command and return its result string. Blocks until the command completes.
    ///
    /// `args` holds the words following the command name. For `PUT`, every word after the key is part
    /// of the value, joined by single spaces.
    pub fn propose(&self, command: &str, args: &[String]) -> Result<String, ProposeError> {
        Event::ReceiveCommand(ReceiveCommandEvent {
            timestamp: SystemTime::now(),
            command: command.to_string(),
            args: args.to_vec(),
        })
        .publish(&self.event_handlers);

        let request = match parse_request(command, args) {
            Ok(request) => request,
            Err(response) => return Ok(response.to_string()),
        };

        let runner = Arc::clone(&self.runner);
        let result = self
            .pool
            .execute(move || match request {
                Request::Get(key) => Ok(runner
                    .store()
                    .get(&key)
                    .unwrap_or_else(|| NO_RECORD_FOUND.to_string())),
                Request::Update(operation) => runner.run(operation).map(|outcome| {
                    if outcome.is_decided() {
                        OPERATION_SUCCESSFUL.to_string()
                    } else {
                        OPERATION_FAILED.to_string()
                    }
                }),
            })
            .map_err(ProposeError::from)
            .and_then(|result| result);

        if let Err(err) = &result {
            log::error!("Proposer failed to execute {} {}: {}", command, args.join(" "), err);
        }
        result
    }

    /// Run one round of the protocol for `operation` on the worker pool, and report how it ended.
    pub fn propose_operation(&self, operation: Operation) -> Result<RoundOutcome, ProposeError> {
        let runner = Arc::clone(&self.runner);
        let outcome = self
            .pool
            .execute(move || runner.run(operation))
            .map_err(ProposeError::from)
            .and_then(|result| result);

        if let Err(err) = &outcome {
            log::error!("Proposer failed to run a round: {}", err);
        }
        outcome
    }

    /// The proposer's own view of the store, updated after every decided round.
    pub fn store(&self) -> &KVStore {
        self.runner.store()
    }

    /// The proposal ID of the most recently started round, if any round was started.
    pub fn last_proposal(&self) -> Option<ProposalID> {
        self.runner.last_proposal()
    }
}

enum Request {
    Get(String),
    Update(Operation),
}

// Validates the command and its arguments. Err carries the response to return without running a round.
fn parse_request(command: &str, args: &[String]) -> Result<Request, &'static str> {
    let command = Command::parse(command).ok_or(INVALID_COMMAND)?;
    let key = args
        .first()
        .filter(|key| !key.is_empty())
        .ok_or(command.usage())?
        .clone();

    match command {
        Command::Get => Ok(Request::Get(key)),
        Command::Put => {
            if args.len() < 2 {
                return Err(command.usage());
            }
            Ok(Request::Update(Operation::put(key, args[1..].join(" "))))
        }
        Command::Delete => Ok(Request::Update(Operation::delete(key))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposeError {
    /// A `prepare`, `accept`, or `learn` call failed under [TransportFailurePolicy::AbortRound].
    Transport {
        proposal: ProposalID,
        error: TransportError,
    },
    /// The worker running the round terminated without reporting a result.
    WorkerLost,
}

impl Display for ProposeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ProposeError::Transport { proposal, error } => {
                write!(f, "{} aborted: {}", proposal, error)
            }
            ProposeError::WorkerLost => f.write_str("proposer worker terminated without a result"),
        }
    }
}

impl std::error::Error for ProposeError {}

impl From<WorkerLost> for ProposeError {
    fn from(_: WorkerLost) -> Self {
        ProposeError::WorkerLost
    }
}
