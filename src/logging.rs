/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Functions that log out events.
//!
//! The logs defined in this module are printed if the user enabled them via the cluster's
//! [configuration](crate::cluster::Configuration).
//!
//! paxos_rs logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
//! printed onto a terminal or to a file, set up a
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
//!
//! ## Log message format
//!
//! Log messages are CSVs (Comma Separated Values) with at least two values. The first two values are
//! always:
//! 1. The name of the [event](crate::events) in PascalCase (defined in this module as constants).
//! 2. The time the event was emitted (as number of seconds since the Unix Epoch).
//!
//! The rest of the values differ depending on the kind of event. For example, the following snippet
//! is how a [ReceiveAccept](crate::events::ReceiveAcceptEvent) is printed:
//!
//! ```text
//! ReceiveAccept, 1701329264, Acceptor2, PROPOSAL-7, q0Fh3tU, ACCEPTED
//! ```
//!
//! In the snippet:
//! - The third value is the name of the acceptor that received the call.
//! - The fourth value is the proposal ID.
//! - The fifth value is the first seven characters of the Base64 encoding of the SHA-256 digest of the
//!   operation.
//! - The sixth value is the acceptor's response.
//!
//! Operations are printed in full (e.g. `PUT key1 value1`) only at the `debug` level.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use std::time::SystemTime;

use crate::event_bus::HandlerPtr;
use crate::events::*;

// Names of each event in PascalCase for printing:
pub const RECEIVE_COMMAND: &str = "ReceiveCommand";
pub const START_ROUND: &str = "StartRound";
pub const COLLECT_PROMISES: &str = "CollectPromises";
pub const COLLECT_ACCEPTANCES: &str = "CollectAcceptances";
pub const DECIDE: &str = "Decide";
pub const SKIP_UNREACHABLE: &str = "SkipUnreachable";
pub const ABORT_ROUND: &str = "AbortRound";

pub const RECEIVE_PREPARE: &str = "ReceivePrepare";
pub const RECEIVE_ACCEPT: &str = "ReceiveAccept";
pub const LEARN: &str = "Learn";

pub const NODE_FAIL: &str = "NodeFail";
pub const NODE_RESTART: &str = "NodeRestart";

/// Implemented by event types. Used to get a closure that logs the event.
pub(crate) trait Logger {
    /// Returns a pointer to the default logging handler for a given event type.
    fn get_logger() -> HandlerPtr<Self>;
}

impl Logger for ReceiveCommandEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |receive_command_event: &ReceiveCommandEvent| {
            log::info!(
                "{}, {}, {}, {}",
                RECEIVE_COMMAND,
                secs_since_unix_epoch(receive_command_event.timestamp),
                receive_command_event.command,
                receive_command_event.args.join(" ")
            )
        };
        Box::new(logger)
    }
}

impl Logger for StartRoundEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |start_round_event: &StartRoundEvent| {
            log::info!(
                "{}, {}, {}, {}",
                START_ROUND,
                secs_since_unix_epoch(start_round_event.timestamp),
                start_round_event.proposal,
                first_seven_base64_chars(&start_round_event.operation.digest())
            );
            log::debug!("{} carries {}", start_round_event.proposal, start_round_event.operation)
        };
        Box::new(logger)
    }
}

impl Logger for CollectPromisesEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |collect_promises_event: &CollectPromisesEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                COLLECT_PROMISES,
                secs_since_unix_epoch(collect_promises_event.timestamp),
                collect_promises_event.proposal,
                collect_promises_event.promises,
                collect_promises_event.acceptors
            )
        };
        Box::new(logger)
    }
}

impl Logger for CollectAcceptancesEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |collect_acceptances_event: &CollectAcceptancesEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                COLLECT_ACCEPTANCES,
                secs_since_unix_epoch(collect_acceptances_event.timestamp),
                collect_acceptances_event.proposal,
                collect_acceptances_event.acceptances,
                collect_acceptances_event.acceptors
            )
        };
        Box::new(logger)
    }
}

impl Logger for DecideEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |decide_event: &DecideEvent| {
            log::info!(
                "{}, {}, {}, {}",
                DECIDE,
                secs_since_unix_epoch(decide_event.timestamp),
                decide_event.proposal,
                first_seven_base64_chars(&decide_event.operation.digest())
            )
        };
        Box::new(logger)
    }
}

impl Logger for SkipUnreachableEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |skip_unreachable_event: &SkipUnreachableEvent| {
            log::warn!(
                "{}, {}, {}, {}",
                SKIP_UNREACHABLE,
                secs_since_unix_epoch(skip_unreachable_event.timestamp),
                skip_unreachable_event.proposal,
                skip_unreachable_event.error
            )
        };
        Box::new(logger)
    }
}

impl Logger for AbortRoundEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |abort_round_event: &AbortRoundEvent| {
            log::error!(
                "{}, {}, {}, {}",
                ABORT_ROUND,
                secs_since_unix_epoch(abort_round_event.timestamp),
                abort_round_event.proposal,
                abort_round_event.error
            )
        };
        Box::new(logger)
    }
}

impl Logger for ReceivePrepareEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |receive_prepare_event: &ReceivePrepareEvent| {
            log::info!(
                "{}, {}, {}, {}",
                RECEIVE_PREPARE,
                secs_since_unix_epoch(receive_prepare_event.timestamp),
                receive_prepare_event.acceptor,
                receive_prepare_event.proposal
            )
        };
        Box::new(logger)
    }
}

impl Logger for ReceiveAcceptEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |receive_accept_event: &ReceiveAcceptEvent| {
            log::info!(
                "{}, {}, {}, {}, {}, {}",
                RECEIVE_ACCEPT,
                secs_since_unix_epoch(receive_accept_event.timestamp),
                receive_accept_event.acceptor,
                receive_accept_event.proposal,
                first_seven_base64_chars(&receive_accept_event.operation.digest()),
                receive_accept_event.response
            )
        };
        Box::new(logger)
    }
}

impl Logger for LearnEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |learn_event: &LearnEvent| {
            log::info!(
                "{}, {}, {}, {}",
                LEARN,
                secs_since_unix_epoch(learn_event.timestamp),
                learn_event.learner,
                first_seven_base64_chars(&learn_event.operation.digest())
            );
            log::debug!("{} learned {}", learn_event.learner, learn_event.operation)
        };
        Box::new(logger)
    }
}

impl Logger for NodeFailEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |node_fail_event: &NodeFailEvent| {
            log::warn!(
                "{}, {}, {}",
                NODE_FAIL,
                secs_since_unix_epoch(node_fail_event.timestamp),
                node_fail_event.node
            )
        };
        Box::new(logger)
    }
}

impl Logger for NodeRestartEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |node_restart_event: &NodeRestartEvent| {
            log::info!(
                "{}, {}, {}",
                NODE_RESTART,
                secs_since_unix_epoch(node_restart_event.timestamp),
                node_restart_event.node
            )
        };
        Box::new(logger)
    }
}

// Get a more readable representation of a bytesequence by base64-encoding it and taking the first 7 characters.
pub(crate) fn first_seven_base64_chars(bytes: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(bytes);
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}

fn secs_since_unix_epoch(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or_default()
}
