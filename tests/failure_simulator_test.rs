use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use log::LevelFilter;
use paxos_rs::{
    cluster::ClusterSpec,
    failure_simulator::{FailureSimulator, FailureSimulatorConfig},
    networking::NodeDirectory,
    proposer::OPERATION_SUCCESSFUL,
    types::basic::{NodeName, Role},
};

mod common;

use crate::common::logging::setup_logger;

// A schedule whose periodic actions never fire during a test.
fn manual(seed: u64) -> FailureSimulatorConfig {
    FailureSimulatorConfig::builder()
        .fail_offset(Duration::from_secs(3600))
        .restart_offset(Duration::from_secs(3600))
        .seed(seed)
        .build()
}

fn directory() -> Arc<NodeDirectory> {
    let directory = Arc::new(NodeDirectory::new());
    directory.register(NodeName::proposer(), Role::Proposer).unwrap();
    for i in 1..=3 {
        directory.register(NodeName::acceptor(i), Role::Acceptor).unwrap();
        directory.register(NodeName::learner(i), Role::Learner).unwrap();
    }
    directory
}

#[test]
fn default_schedule() {
    let config = FailureSimulatorConfig::default();
    assert_eq!(config.period, Duration::from_secs(30));
    assert_eq!(config.fail_offset, Duration::from_secs(10));
    assert_eq!(config.restart_offset, Duration::from_secs(20));
    assert_eq!(config.seed, None);
}

#[test]
fn seeded_simulators_choose_the_same_nodes() {
    let first = FailureSimulator::start(manual(42), directory());
    let second = FailureSimulator::start(manual(42), directory());

    let first_choices: Vec<Option<NodeName>> = (0..20)
        .map(|i| if i % 2 == 0 { first.simulate_failure() } else { first.simulate_restart() })
        .collect();
    let second_choices: Vec<Option<NodeName>> = (0..20)
        .map(|i| if i % 2 == 0 { second.simulate_failure() } else { second.simulate_restart() })
        .collect();

    assert!(first_choices.iter().all(Option::is_some));
    assert_eq!(first_choices, second_choices);
}

#[test]
fn failure_and_restart_toggle_reachability() {
    let directory = directory();
    let simulator = FailureSimulator::start(manual(7), directory.clone());

    let failed = simulator.simulate_failure().unwrap();
    assert!(!directory.is_available(&failed));
    assert_eq!(directory.unavailable(), vec![failed.clone()]);

    // Restarts choose independently of failures, so keep restarting until the failed node is chosen.
    while simulator.simulate_restart().unwrap() != failed {}
    assert!(directory.is_available(&failed));
    assert!(directory.unavailable().is_empty());
}

#[test]
fn empty_directory_has_nothing_to_fail() {
    let simulator = FailureSimulator::start(manual(1), Arc::new(NodeDirectory::new()));

    assert_eq!(simulator.simulate_failure(), None);
    assert_eq!(simulator.simulate_restart(), None);
}

#[test]
fn cluster_exposes_its_simulator() {
    let without = ClusterSpec::builder().build().start().unwrap();
    assert!(without.failure_simulator().is_none());

    let cluster = ClusterSpec::builder()
        .failure_simulator(manual(11))
        .build()
        .start()
        .unwrap();
    let simulator = cluster.failure_simulator().unwrap();

    let failed = simulator.simulate_failure().unwrap();
    assert_eq!(cluster.directory().unavailable(), vec![failed]);
}

#[test]
fn restored_nodes_keep_their_state() {
    let cluster = ClusterSpec::builder().build().start().unwrap();
    let client = cluster.client();
    assert_eq!(client.submit("PUT k1 v1").unwrap(), OPERATION_SUCCESSFUL);

    let acceptor = NodeName::acceptor(1);
    let learner = NodeName::learner(1);
    cluster.directory().mark_unavailable(&acceptor).unwrap();
    cluster.directory().mark_unavailable(&learner).unwrap();
    assert_eq!(cluster.directory().restore(&acceptor), Ok(true));
    assert_eq!(cluster.directory().restore(&learner), Ok(true));
    // Restoring an available node is a no-op.
    assert_eq!(cluster.directory().restore(&learner), Ok(false));

    assert_eq!(cluster.acceptors()[0].promise_count(), 1);
    assert_eq!(cluster.acceptors()[0].acceptance_count(), 1);
    assert_eq!(cluster.learners()[0].store().get("k1"), Some("v1".to_string()));

    assert_eq!(client.submit("PUT k2 v2").unwrap(), OPERATION_SUCCESSFUL);
    assert_eq!(cluster.acceptors()[0].acceptance_count(), 2);
    assert_eq!(cluster.learners()[0].store().len(), 2);
}

#[test]
fn scheduler_fails_and_restarts_nodes_periodically() {
    setup_logger(LevelFilter::Info);
    let failures = Arc::new(AtomicUsize::new(0));
    let restarts = Arc::new(AtomicUsize::new(0));
    let cluster = {
        let (failures, restarts) = (failures.clone(), restarts.clone());
        ClusterSpec::builder()
            .failure_simulator(
                FailureSimulatorConfig::builder()
                    .period(Duration::from_millis(20))
                    .fail_offset(Duration::ZERO)
                    .restart_offset(Duration::from_millis(10))
                    .seed(3)
                    .build(),
            )
            .on_node_fail(move |_| {
                failures.fetch_add(1, Ordering::SeqCst);
            })
            .on_node_restart(move |_| {
                restarts.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .start()
            .unwrap()
    };

    thread::sleep(Duration::from_millis(300));
    // Dropping the cluster stops the scheduler.
    drop(cluster);
    let (failed, restarted) = (failures.load(Ordering::SeqCst), restarts.load(Ordering::SeqCst));

    assert!(failed >= 3, "only {} failures", failed);
    assert!(restarted >= 3, "only {} restarts", restarted);

    thread::sleep(Duration::from_millis(60));
    assert_eq!(failures.load(Ordering::SeqCst), failed);
    assert_eq!(restarts.load(Ordering::SeqCst), restarted);
}
