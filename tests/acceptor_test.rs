use paxos_rs::{
    acceptor::Acceptor,
    types::{
        basic::{AcceptResponse, NodeName, PrepareResponse, ProposalID},
        operation::Operation,
    },
};

#[test]
fn prepare_is_idempotent() {
    let acceptor = Acceptor::new(NodeName::acceptor(1));
    let proposal = ProposalID::new(1);

    assert_eq!(acceptor.prepare(proposal), PrepareResponse::Promise);
    assert!(acceptor.is_promised(proposal));
    assert_eq!(acceptor.promise_count(), 1);

    assert_eq!(acceptor.prepare(proposal), PrepareResponse::Promise);
    assert_eq!(acceptor.promise_count(), 1);
    assert_eq!(acceptor.acceptance_count(), 0);
}

#[test]
fn accept_without_promise_is_rejected() {
    let acceptor = Acceptor::new(NodeName::acceptor(1));
    let proposal = ProposalID::new(3);

    assert_eq!(
        acceptor.accept(proposal, Operation::put("k1", "v1")),
        AcceptResponse::Rejected
    );
    assert_eq!(acceptor.accepted_operation(proposal), None);
    assert_eq!(acceptor.acceptance_count(), 0);
    assert!(!acceptor.is_promised(proposal));
}

#[test]
fn accept_after_promise_records_the_operation() {
    let acceptor = Acceptor::new(NodeName::acceptor(2));
    let promised = ProposalID::new(1);
    let unpromised = ProposalID::new(2);

    acceptor.prepare(promised);
    assert_eq!(
        acceptor.accept(promised, Operation::delete("k1")),
        AcceptResponse::Accepted
    );
    assert_eq!(
        acceptor.accepted_operation(promised),
        Some(Operation::delete("k1"))
    );

    // A promise for one proposal does not carry over to another.
    assert_eq!(
        acceptor.accept(unpromised, Operation::delete("k1")),
        AcceptResponse::Rejected
    );
    assert_eq!(acceptor.acceptance_count(), 1);
}

#[test]
fn prepare_after_accept_changes_nothing() {
    let acceptor = Acceptor::new(NodeName::acceptor(1));
    let proposal = ProposalID::new(9);

    acceptor.prepare(proposal);
    acceptor.accept(proposal, Operation::put("k", "v"));

    assert_eq!(acceptor.prepare(proposal), PrepareResponse::Promise);
    assert_eq!(acceptor.promise_count(), 1);
    assert_eq!(acceptor.acceptance_count(), 1);
    assert_eq!(
        acceptor.accepted_operation(proposal),
        Some(Operation::put("k", "v"))
    );
}
