/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Dispatches [events](crate::events) to the default loggers and to user-registered handlers.
//!
//! Handlers run synchronously on the thread that emitted the event, which may be a proposer worker, the
//! caller of an acceptor or learner, or the failure simulator thread. Handlers should therefore return
//! quickly.

use crate::events::*;
use crate::logging::Logger;

pub(crate) type HandlerPtr<T> = Box<dyn Fn(&T) + Send + Sync>;

#[derive(Default)]
pub(crate) struct EventHandlers {
    pub(crate) receive_command_handlers: Vec<HandlerPtr<ReceiveCommandEvent>>,
    pub(crate) start_round_handlers: Vec<HandlerPtr<StartRoundEvent>>,
    pub(crate) collect_promises_handlers: Vec<HandlerPtr<CollectPromisesEvent>>,
    pub(crate) collect_acceptances_handlers: Vec<HandlerPtr<CollectAcceptancesEvent>>,
    pub(crate) decide_handlers: Vec<HandlerPtr<DecideEvent>>,
    pub(crate) skip_unreachable_handlers: Vec<HandlerPtr<SkipUnreachableEvent>>,
    pub(crate) abort_round_handlers: Vec<HandlerPtr<AbortRoundEvent>>,
    pub(crate) receive_prepare_handlers: Vec<HandlerPtr<ReceivePrepareEvent>>,
    pub(crate) receive_accept_handlers: Vec<HandlerPtr<ReceiveAcceptEvent>>,
    pub(crate) learn_handlers: Vec<HandlerPtr<LearnEvent>>,
    pub(crate) node_fail_handlers: Vec<HandlerPtr<NodeFailEvent>>,
    pub(crate) node_restart_handlers: Vec<HandlerPtr<NodeRestartEvent>>,
}

impl EventHandlers {
    /// Creates the handler set. If `log_events` is true, the default logger of every event type is
    /// registered before the user-provided handlers.
    pub(crate) fn new(log_events: bool, user_handlers: EventHandlers) -> EventHandlers {
        let mut handlers = EventHandlers::default();
        if log_events {
            handlers.receive_command_handlers.push(ReceiveCommandEvent::get_logger());
            handlers.start_round_handlers.push(StartRoundEvent::get_logger());
            handlers.collect_promises_handlers.push(CollectPromisesEvent::get_logger());
            handlers.collect_acceptances_handlers.push(CollectAcceptancesEvent::get_logger());
            handlers.decide_handlers.push(DecideEvent::get_logger());
            handlers.skip_unreachable_handlers.push(SkipUnreachableEvent::get_logger());
            handlers.abort_round_handlers.push(AbortRoundEvent::get_logger());
            handlers.receive_prepare_handlers.push(ReceivePrepareEvent::get_logger());
            handlers.receive_accept_handlers.push(ReceiveAcceptEvent::get_logger());
            handlers.learn_handlers.push(LearnEvent::get_logger());
            handlers.node_fail_handlers.push(NodeFailEvent::get_logger());
            handlers.node_restart_handlers.push(NodeRestartEvent::get_logger());
        }
        handlers.extend(user_handlers);
        handlers
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.receive_command_handlers.is_empty()
            && self.start_round_handlers.is_empty()
            && self.collect_promises_handlers.is_empty()
            && self.collect_acceptances_handlers.is_empty()
            && self.decide_handlers.is_empty()
            && self.skip_unreachable_handlers.is_empty()
            && self.abort_round_handlers.is_empty()
            && self.receive_prepare_handlers.is_empty()
            && self.receive_accept_handlers.is_empty()
            && self.learn_handlers.is_empty()
            && self.node_fail_handlers.is_empty()
            && self.node_restart_handlers.is_empty()
    }

    fn extend(&mut self, other: EventHandlers) {
        self.receive_command_handlers.extend(other.receive_command_handlers);
        self.start_round_handlers.extend(other.start_round_handlers);
        self.collect_promises_handlers.extend(other.collect_promises_handlers);
        self.collect_acceptances_handlers.extend(other.collect_acceptances_handlers);
        self.decide_handlers.extend(other.decide_handlers);
        self.skip_unreachable_handlers.extend(other.skip_unreachable_handlers);
        self.abort_round_handlers.extend(other.abort_round_handlers);
        self.receive_prepare_handlers.extend(other.receive_prepare_handlers);
        self.receive_accept_handlers.extend(other.receive_accept_handlers);
        self.learn_handlers.extend(other.learn_handlers);
        self.node_fail_handlers.extend(other.node_fail_handlers);
        self.node_restart_handlers.extend(other.node_restart_handlers);
    }

    pub(crate) fn fire_handlers(&self, event: Event) {
        match event {
            Event::ReceiveCommand(receive_command_event) =>
                self.receive_command_handlers.iter().for_each(|handler| handler(&receive_command_event)),

            Event::StartRound(start_round_event) =>
                self.start_round_handlers.iter().for_each(|handler| handler(&start_round_event)),

            Event::CollectPromises(collect_promises_event) =>
                self.collect_promises_handlers.iter().for_each(|handler| handler(&collect_promises_event)),

            Event::CollectAcceptances(collect_acceptances_event) =>
                self.collect_acceptances_handlers.iter().for_each(|handler| handler(&collect_acceptances_event)),

            Event::Decide(decide_event) =>
                self.decide_handlers.iter().for_each(|handler| handler(&decide_event)),

            Event::SkipUnreachable(skip_unreachable_event) =>
                self.skip_unreachable_handlers.iter().for_each(|handler| handler(&skip_unreachable_event)),

            Event::AbortRound(abort_round_event) =>
                self.abort_round_handlers.iter().for_each(|handler| handler(&abort_round_event)),

            Event::ReceivePrepare(receive_prepare_event) =>
                self.receive_prepare_handlers.iter().for_each(|handler| handler(&receive_prepare_event)),

            Event::ReceiveAccept(receive_accept_event) =>
                self.receive_accept_handlers.iter().for_each(|handler| handler(&receive_accept_event)),

            Event::Learn(learn_event) =>
                self.learn_handlers.iter().for_each(|handler| handler(&learn_event)),

            Event::NodeFail(node_fail_event) =>
                self.node_fail_handlers.iter().for_each(|handler| handler(&node_fail_event)),

            Event::NodeRestart(node_restart_event) =>
                self.node_restart_handlers.iter().for_each(|handler| handler(&node_restart_event)),
        }
    }
}
