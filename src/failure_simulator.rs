/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Random failure injection against the nodes of a cluster.
//!
//! The [FailureSimulator] runs two periodic actions on a single scheduler thread:
//! 1. **Fail**: every `period`, starting `fail_offset` after the simulator starts, one registered node is
//!    chosen uniformly at random and [marked unavailable](NodeDirectory::mark_unavailable).
//! 2. **Restart**: every `period`, starting `restart_offset` after the simulator starts, one registered
//!    node is chosen uniformly at random and [restored](NodeDirectory::restore).
//!
//! The two choices are independent: a restart may pick a node that is already available, and a failure
//! may pick a node that is already unavailable. Only reachability changes. The in-memory instance of a
//! failed node keeps its state, and serves calls again with that state once it is restored.
//!
//! The actions are scheduled at a fixed rate: a slow action does not delay the ones after it.
//!
//! ## Starting a failure simulator
//!
//! ```ignore
//! let config =
//!     FailureSimulatorConfig::builder()
//!     .period(Duration::from_secs(30))
//!     .fail_offset(Duration::from_secs(10))
//!     .restart_offset(Duration::from_secs(20))
//!     .seed(7)
//!     .build();
//!
//! let simulator = FailureSimulator::start(config, directory);
//! ```
//!
//! The scheduler thread is stopped and joined when the [FailureSimulator] is dropped.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use typed_builder::TypedBuilder;

use crate::event_bus::EventHandlers;
use crate::events::{Event, NodeFailEvent, NodeRestartEvent};
use crate::networking::NodeDirectory;
use crate::types::basic::NodeName;

/// The schedule of a [FailureSimulator].
///
/// Periods shorter than one millisecond are raised to one millisecond.
#[derive(Clone, Debug, TypedBuilder)]
#[builder(builder_method(doc =
    "
    Create a builder for building a [FailureSimulatorConfig]. Every setter is optional.

    Optional:
    - `.period(...)`
    - `.fail_offset(...)`
    - `.restart_offset(...)`
    - `.seed(...)`
"
))]
pub struct FailureSimulatorConfig {
    #[builder(default = Duration::from_secs(30), setter(doc = "Set the interval between two failures, and between two restarts. Optional, defaults to 30 seconds."))]
    pub period: Duration,
    #[builder(default = Duration::from_secs(10), setter(doc = "Set the delay between starting the simulator and the first failure. Optional, defaults to 10 seconds."))]
    pub fail_offset: Duration,
    #[builder(default = Duration::from_secs(20), setter(doc = "Set the delay between starting the simulator and the first restart. Optional, defaults to 20 seconds."))]
    pub restart_offset: Duration,
    #[builder(default, setter(strip_option, doc = "Seed the random choice of nodes, making the sequence of choices reproducible. Optional."))]
    pub seed: Option<u64>,
}

impl Default for FailureSimulatorConfig {
    fn default() -> Self {
        FailureSimulatorConfig::builder().build()
    }
}

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A handle to a running failure simulator. Dropping it stops the scheduler thread.
pub struct FailureSimulator {
    injector: Arc<Injector>,
    scheduler: Option<JoinHandle<()>>,
    scheduler_shutdown: Sender<()>,
}

impl FailureSimulator {
    /// Start injecting failures into the nodes registered in `directory`.
    pub fn start(config: FailureSimulatorConfig, directory: Arc<NodeDirectory>) -> FailureSimulator {
        FailureSimulator::with_event_handlers(config, directory, None)
    }

    pub(crate) fn with_event_handlers(
        config: FailureSimulatorConfig,
        directory: Arc<NodeDirectory>,
        event_handlers: Option<Arc<EventHandlers>>,
    ) -> FailureSimulator {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let injector = Arc::new(Injector {
            directory,
            rng: Mutex::new(rng),
            event_handlers,
        });

        let (scheduler_shutdown, scheduler_shutdown_receiver) = mpsc::channel();
        let scheduler = start_scheduler(config, Arc::clone(&injector), scheduler_shutdown_receiver);

        FailureSimulator {
            injector,
            scheduler: Some(scheduler),
            scheduler_shutdown,
        }
    }

    /// Immediately mark one node, chosen uniformly at random, unavailable. Returns the chosen node, or
    /// `None` if the directory is empty.
    pub fn simulate_failure(&self) -> Option<NodeName> {
        self.injector.simulate_failure()
    }

    /// Immediately restore one node, chosen uniformly at random. Returns the chosen node, or `None` if
    /// the directory is empty.
    pub fn simulate_restart(&self) -> Option<NodeName> {
        self.injector.simulate_restart()
    }
}

impl Drop for FailureSimulator {
    fn drop(&mut self) {
        // The scheduler may have exited already if its thread panicked.
        let _ = self.scheduler_shutdown.send(());
        if let Some(scheduler) = self.scheduler.take() {
            if scheduler.join().is_err() {
                log::error!("Failure simulator thread panicked");
            }
        }
    }
}

struct Injector {
    directory: Arc<NodeDirectory>,
    rng: Mutex<StdRng>,
    event_handlers: Option<Arc<EventHandlers>>,
}

impl Injector {
    fn simulate_failure(&self) -> Option<NodeName> {
        let node = self.choose()?;
        match self.directory.mark_unavailable(&node) {
            Ok(was_available) => {
                log::info!("Simulated failure of {} (was available: {})", node, was_available);
                Event::NodeFail(NodeFailEvent {
                    timestamp: SystemTime::now(),
                    node: node.clone(),
                })
                .publish(&self.event_handlers);
            }
            Err(err) => log::error!("Failed to simulate a failure: {}", err),
        }
        Some(node)
    }

    fn simulate_restart(&self) -> Option<NodeName> {
        let node = self.choose()?;
        match self.directory.restore(&node) {
            Ok(was_unavailable) => {
                log::info!("Simulated restart of {} (was unavailable: {})", node, was_unavailable);
                Event::NodeRestart(NodeRestartEvent {
                    timestamp: SystemTime::now(),
                    node: node.clone(),
                })
                .publish(&self.event_handlers);
            }
            Err(err) => log::error!("Failed to simulate a restart: {}", err),
        }
        Some(node)
    }

    fn choose(&self) -> Option<NodeName> {
        let names = self.directory.names();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        names.choose(&mut *rng).cloned()
    }
}

fn start_scheduler(
    config: FailureSimulatorConfig,
    injector: Arc<Injector>,
    shutdown_signal: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let period = config.period.max(MIN_PERIOD);
        let start = Instant::now();
        let mut next_failure = start + config.fail_offset;
        let mut next_restart = start + config.restart_offset;

        loop {
            let next_action = next_failure.min(next_restart);
            match shutdown_signal.recv_timeout(next_action.saturating_duration_since(Instant::now())) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => (),
            }

            let now = Instant::now();
            if next_failure <= now {
                injector.simulate_failure();
                next_failure += period;
            }
            if next_restart <= now {
                injector.simulate_restart();
                next_restart += period;
            }
        }
    })
}
