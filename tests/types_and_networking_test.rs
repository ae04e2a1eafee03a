use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use paxos_rs::{
    acceptor::Acceptor,
    learner::Learner,
    networking::{DirectoryError, LocalNetwork, Network, NodeDirectory, Rpc, TransportError},
    types::{
        basic::{AcceptResponse, NodeName, PrepareResponse, ProposalID, Role},
        operation::{Command, Operation},
    },
};

#[test]
fn proposal_ids_render_with_their_counter() {
    assert_eq!(ProposalID::new(7).to_string(), "PROPOSAL-7");
    assert!(ProposalID::new(7) < ProposalID::new(8));
}

#[test]
fn operation_text_form() {
    assert_eq!(Operation::put("k1", "v1").to_string(), "PUT k1 v1");
    assert_eq!(Operation::delete("k1").to_string(), "DELETE k1");
    assert_eq!(Operation::put("k1", "two words").to_string(), "PUT k1 two words");
}

#[test]
fn operation_wire_form_keeps_spaces() {
    let operation = Operation::put("a key", "a value with spaces");
    let bytes = operation.to_bytes();

    assert_eq!(Operation::from_bytes(&bytes).unwrap(), operation);
    assert!(Operation::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    assert_ne!(operation.digest(), Operation::put("a key", "another value").digest());
}

#[test]
fn commands_are_matched_exactly() {
    assert_eq!(Command::parse("GET"), Some(Command::Get));
    assert_eq!(Command::parse("PUT"), Some(Command::Put));
    assert_eq!(Command::parse("DELETE"), Some(Command::Delete));
    assert_eq!(Command::parse("Get"), None);
    assert_eq!(Command::parse(""), None);
}

#[test]
fn directory_tracks_availability() {
    let directory = NodeDirectory::new();
    let acceptor = NodeName::acceptor(1);
    directory.register(acceptor.clone(), Role::Acceptor).unwrap();

    assert_eq!(
        directory.register(acceptor.clone(), Role::Learner),
        Err(DirectoryError::AlreadyRegistered(acceptor.clone()))
    );
    assert_eq!(directory.resolve(&acceptor, Rpc::Prepare), Ok(Role::Acceptor));

    assert_eq!(directory.mark_unavailable(&acceptor), Ok(true));
    assert_eq!(directory.mark_unavailable(&acceptor), Ok(false));
    assert_eq!(
        directory.resolve(&acceptor, Rpc::Accept),
        Err(TransportError::Unavailable {
            node: acceptor.clone(),
            rpc: Rpc::Accept,
        })
    );
    assert_eq!(directory.role(&acceptor), Some(Role::Acceptor));

    let unknown = NodeName::new("Acceptor9");
    assert_eq!(
        directory.restore(&unknown),
        Err(DirectoryError::UnknownNode(unknown.clone()))
    );
    assert_eq!(
        directory.resolve(&unknown, Rpc::Prepare),
        Err(TransportError::UnknownNode {
            node: unknown,
            rpc: Rpc::Prepare,
        })
    );
}

#[test]
fn local_network_delivers_to_registered_nodes() {
    let directory = Arc::new(NodeDirectory::new());
    directory.register(NodeName::acceptor(1), Role::Acceptor).unwrap();
    directory.register(NodeName::learner(1), Role::Learner).unwrap();
    let acceptor = Arc::new(Acceptor::new(NodeName::acceptor(1)));
    let learner = Arc::new(Learner::new(NodeName::learner(1)));
    let network = LocalNetwork::new(directory.clone(), [acceptor.clone()], [learner.clone()]);
    let deadline = Instant::now() + Duration::from_secs(1);
    let proposal = ProposalID::new(1);
    let operation = Operation::put("k1", "v 1");

    assert_eq!(
        network.prepare(&NodeName::acceptor(1), proposal, deadline),
        Ok(PrepareResponse::Promise)
    );
    assert_eq!(
        network.accept(&NodeName::acceptor(1), proposal, &operation, deadline),
        Ok(AcceptResponse::Accepted)
    );
    assert_eq!(network.learn(&NodeName::learner(1), &operation, deadline), Ok(()));

    assert_eq!(acceptor.accepted_operation(proposal), Some(operation));
    assert_eq!(learner.store().get("k1"), Some("v 1".to_string()));

    // An acceptor cannot be reached with a learner call.
    assert!(matches!(
        network.learn(&NodeName::acceptor(1), &Operation::delete("k1"), deadline),
        Err(TransportError::UnknownNode { rpc: Rpc::Learn, .. })
    ));
    directory.mark_unavailable(&NodeName::learner(1)).unwrap();
    assert!(matches!(
        network.learn(&NodeName::learner(1), &Operation::delete("k1"), deadline),
        Err(TransportError::Unavailable { rpc: Rpc::Learn, .. })
    ));
    assert_eq!(learner.store().get("k1"), Some("v 1".to_string()));
}
