use std::collections::HashSet;
use std::thread;

use log::LevelFilter;
use paxos_rs::{
    networking::{Rpc, TransportError},
    proposer::{
        is_quorum, ProposeError, RoundOutcome, TransportFailurePolicy, INVALID_COMMAND,
        NO_RECORD_FOUND, OPERATION_FAILED, OPERATION_SUCCESSFUL,
    },
    types::{basic::NodeName, operation::Operation},
};

mod common;

use crate::common::{
    logging::setup_logger,
    nodes::{config, Nodes},
};

#[test]
fn quorum_is_a_strict_majority() {
    assert!(is_quorum(1, 1));
    assert!(!is_quorum(0, 1));
    assert!(is_quorum(2, 2));
    assert!(!is_quorum(1, 2));
    assert!(is_quorum(2, 3));
    assert!(!is_quorum(1, 3));
    assert!(is_quorum(3, 4));
    assert!(!is_quorum(2, 4));
    assert!(is_quorum(3, 5));
    assert!(!is_quorum(2, 5));
}

#[test]
fn round_decides_iff_a_majority_of_acceptors_is_reachable() {
    setup_logger(LevelFilter::Debug);

    for acceptors in 1..=5 {
        for down in 0..=acceptors {
            let nodes = Nodes::new(acceptors, 2, config(TransportFailurePolicy::IsolateUnreachable));
            for i in 1..=down {
                nodes.fail(NodeName::acceptor(i));
            }

            let response = nodes.propose("PUT k1 v1");

            let reachable = acceptors - down;
            if reachable > acceptors / 2 {
                assert_eq!(response, OPERATION_SUCCESSFUL, "{} of {} down", down, acceptors);
                assert_eq!(nodes.proposer.store().get("k1"), Some("v1".to_string()));
                for learner in &nodes.learners {
                    assert_eq!(learner.store().get("k1"), Some("v1".to_string()));
                }
            } else {
                assert_eq!(response, OPERATION_FAILED, "{} of {} down", down, acceptors);
                assert!(nodes.proposer.store().is_empty());
                assert_eq!(nodes.network.count(Rpc::Accept), 0);
                assert_eq!(nodes.network.count(Rpc::Learn), 0);
                for learner in &nodes.learners {
                    assert!(learner.store().is_empty());
                }
            }
        }
    }
}

#[test]
fn get_makes_no_remote_calls_and_changes_nothing() {
    let nodes = Nodes::new(3, 3, config(TransportFailurePolicy::AbortRound));
    assert_eq!(nodes.propose("PUT k1 v1"), OPERATION_SUCCESSFUL);
    let before = nodes.proposer.store().snapshot();
    let last_proposal = nodes.proposer.last_proposal();
    nodes.network.reset();

    assert_eq!(nodes.propose("GET k1"), "v1");
    assert_eq!(nodes.propose("GET missing"), NO_RECORD_FOUND);

    assert!(nodes.network.calls().is_empty());
    assert_eq!(nodes.proposer.store().snapshot(), before);
    assert_eq!(nodes.proposer.last_proposal(), last_proposal);
}

#[test]
fn missing_arguments_are_answered_with_usage_hints() {
    let nodes = Nodes::new(3, 1, config(TransportFailurePolicy::AbortRound));
    let no_args: Vec<String> = Vec::new();

    assert_eq!(
        nodes.proposer.propose("PUT", &no_args).unwrap(),
        "Example Usage: PUT <key> <value>"
    );
    assert_eq!(
        nodes.proposer.propose("PUT", &["k1".to_string()]).unwrap(),
        "Example Usage: PUT <key> <value>"
    );
    assert_eq!(
        nodes.proposer.propose("DELETE", &no_args).unwrap(),
        "Example Usage: DELETE <key>"
    );
    assert_eq!(
        nodes.proposer.propose("GET", &no_args).unwrap(),
        "Example Usage: GET <key>"
    );

    assert!(nodes.network.calls().is_empty());
    assert_eq!(nodes.proposer.last_proposal(), None);
}

#[test]
fn unknown_commands_are_rejected() {
    let nodes = Nodes::new(3, 1, config(TransportFailurePolicy::AbortRound));

    assert_eq!(nodes.propose("POST k1 v1"), INVALID_COMMAND);
    // Command names are case sensitive.
    assert_eq!(nodes.propose("put k1 v1"), INVALID_COMMAND);

    assert!(nodes.network.calls().is_empty());
    assert!(nodes.proposer.store().is_empty());
}

#[test]
fn put_value_keeps_every_word_after_the_key() {
    let nodes = Nodes::new(3, 1, config(TransportFailurePolicy::AbortRound));

    assert_eq!(nodes.propose("PUT greeting hello paxos world"), OPERATION_SUCCESSFUL);

    assert_eq!(nodes.propose("GET greeting"), "hello paxos world");
    assert_eq!(
        nodes.learners[0].store().get("greeting"),
        Some("hello paxos world".to_string())
    );
}

#[test]
fn unreachable_acceptor_aborts_the_round() {
    setup_logger(LevelFilter::Debug);
    let nodes = Nodes::new(3, 3, config(TransportFailurePolicy::AbortRound));
    nodes.fail(NodeName::acceptor(2));

    let args = vec!["k1".to_string(), "v1".to_string()];
    let result = nodes.proposer.propose("PUT", &args);

    assert_eq!(
        result,
        Err(ProposeError::Transport {
            proposal: nodes.proposer.last_proposal().unwrap(),
            error: TransportError::Unavailable {
                node: NodeName::acceptor(2),
                rpc: Rpc::Prepare,
            },
        })
    );

    // The round stops at the first failed call.
    assert_eq!(
        nodes.network.calls(),
        vec![
            (Rpc::Prepare, NodeName::acceptor(1)),
            (Rpc::Prepare, NodeName::acceptor(2)),
        ]
    );
    assert!(nodes.proposer.store().is_empty());
    assert_eq!(nodes.acceptors[2].promise_count(), 0);
}

#[test]
fn unreachable_learner_aborts_the_round_before_the_local_apply() {
    let nodes = Nodes::new(3, 3, config(TransportFailurePolicy::AbortRound));
    nodes.fail(NodeName::learner(2));

    let result = nodes.proposer.propose_operation(Operation::put("k1", "v1"));

    assert!(matches!(
        result,
        Err(ProposeError::Transport {
            error: TransportError::Unavailable { rpc: Rpc::Learn, .. },
            ..
        })
    ));
    assert_eq!(nodes.learners[0].store().get("k1"), Some("v1".to_string()));
    assert!(nodes.learners[1].store().is_empty());
    assert!(nodes.learners[2].store().is_empty());
    assert!(nodes.proposer.store().is_empty());
}

#[test]
fn unreachable_minority_is_skipped_when_isolating() {
    let nodes = Nodes::new(3, 3, config(TransportFailurePolicy::IsolateUnreachable));
    nodes.fail(NodeName::acceptor(3));
    nodes.fail(NodeName::learner(1));

    let outcome = nodes
        .proposer
        .propose_operation(Operation::put("k1", "v1"))
        .unwrap();

    assert!(outcome.is_decided());
    assert_eq!(nodes.acceptors[0].acceptance_count(), 1);
    assert_eq!(nodes.acceptors[1].acceptance_count(), 1);
    assert_eq!(nodes.acceptors[2].acceptance_count(), 0);
    assert!(nodes.learners[0].store().is_empty());
    assert_eq!(nodes.learners[1].store().get("k1"), Some("v1".to_string()));
    assert_eq!(nodes.proposer.store().get("k1"), Some("v1".to_string()));
}

#[test]
fn missing_promise_quorum_skips_the_accept_phase() {
    let nodes = Nodes::new(3, 1, config(TransportFailurePolicy::IsolateUnreachable));
    nodes.fail(NodeName::acceptor(1));
    nodes.fail(NodeName::acceptor(2));

    let outcome = nodes
        .proposer
        .propose_operation(Operation::delete("k1"))
        .unwrap();

    assert!(matches!(outcome, RoundOutcome::NoPromiseQuorum { promises: 1, .. }));
    assert_eq!(nodes.network.count(Rpc::Prepare), 3);
    assert_eq!(nodes.network.count(Rpc::Accept), 0);
    assert_eq!(nodes.network.count(Rpc::Learn), 0);
}

#[test]
fn concurrent_rounds_get_unique_proposal_ids() {
    let nodes = Nodes::new(3, 2, config(TransportFailurePolicy::AbortRound));
    let rounds = 24;

    let proposals: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..rounds)
            .map(|i| {
                let proposer = &nodes.proposer;
                scope.spawn(move || {
                    proposer
                        .propose_operation(Operation::put(format!("k{}", i), format!("v{}", i)))
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert!(proposals.iter().all(RoundOutcome::is_decided));
    let unique: HashSet<_> = proposals.iter().map(RoundOutcome::proposal).collect();
    assert_eq!(unique.len(), rounds);
    assert_eq!(nodes.proposer.last_proposal().unwrap().int(), rounds as u64);
    for i in 0..rounds {
        assert_eq!(
            nodes.learners[1].store().get(&format!("k{}", i)),
            Some(format!("v{}", i))
        );
    }
}
