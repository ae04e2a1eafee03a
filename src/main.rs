/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use paxos_rs::cluster::{ClusterSpec, Configuration};
use paxos_rs::failure_simulator::FailureSimulatorConfig;
use paxos_rs::proposer::{RoundSerialization, TransportFailurePolicy};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of acceptors
    #[arg(short, long, default_value = "3")]
    acceptors: usize,

    /// Number of learners
    #[arg(short, long, default_value = "3")]
    learners: usize,

    /// Do not inject random node failures
    #[arg(long)]
    no_failures: bool,

    /// Seconds between two injected failures, and between two restarts
    #[arg(long, default_value = "30")]
    failure_period: u64,

    /// Seconds before the first injected failure
    #[arg(long, default_value = "10")]
    fail_offset: u64,

    /// Seconds before the first restart
    #[arg(long, default_value = "20")]
    restart_offset: u64,

    /// Seed for the choice of failed and restarted nodes
    #[arg(long)]
    seed: Option<u64>,

    /// Timeout of a single remote call, in milliseconds
    #[arg(long, default_value = "2000")]
    call_timeout: u64,

    /// What a round does when a node cannot be reached
    #[arg(long, value_enum, default_value_t = Policy::Abort)]
    policy: Policy,

    /// How concurrent rounds are ordered
    #[arg(long, value_enum, default_value_t = Serialization::Relaxed)]
    serialization: Serialization,

    /// Maximum level of the messages that are logged
    #[arg(long, value_enum, default_value_t = Level::Info)]
    log_level: Level,

    /// Also append log messages to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Policy {
    Abort,
    Isolate,
}

impl From<Policy> for TransportFailurePolicy {
    fn from(value: Policy) -> Self {
        match value {
            Policy::Abort => TransportFailurePolicy::AbortRound,
            Policy::Isolate => TransportFailurePolicy::IsolateUnreachable,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Serialization {
    Relaxed,
    Global,
    PerKey,
}

impl From<Serialization> for RoundSerialization {
    fn from(value: Serialization) -> Self {
        match value {
            Serialization::Relaxed => RoundSerialization::Relaxed,
            Serialization::Global => RoundSerialization::Global,
            Serialization::PerKey => RoundSerialization::PerKey,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Level {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<Level> for LevelFilter {
    fn from(value: Level) -> Self {
        match value {
            Level::Off => LevelFilter::Off,
            Level::Error => LevelFilter::Error,
            Level::Warn => LevelFilter::Warn,
            Level::Info => LevelFilter::Info,
            Level::Debug => LevelFilter::Debug,
            Level::Trace => LevelFilter::Trace,
        }
    }
}

fn setup_logger(level: LevelFilter, log_file: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{:?}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                thread::current().id(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(io::stdout());
    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }
    dispatch.apply()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_logger(args.log_level.into(), args.log_file.as_ref())?;

    let configuration = Configuration::builder()
        .call_timeout(Duration::from_millis(args.call_timeout))
        .transport_failure_policy(args.policy.into())
        .round_serialization(args.serialization.into())
        .log_events(true)
        .build();

    let failure_simulator = (!args.no_failures).then(|| FailureSimulatorConfig {
        period: Duration::from_secs(args.failure_period),
        fail_offset: Duration::from_secs(args.fail_offset),
        restart_offset: Duration::from_secs(args.restart_offset),
        seed: args.seed,
    });

    let cluster_spec = ClusterSpec::builder()
        .acceptors(args.acceptors)
        .learners(args.learners)
        .configuration(configuration);
    let cluster = match failure_simulator {
        Some(config) => cluster_spec.failure_simulator(config).build().start()?,
        None => cluster_spec.build().start()?,
    };

    let client = cluster.client();
    for (line, result) in paxos_rs::client::DEMO_COMMANDS.iter().zip(client.prepopulate()) {
        match result {
            Ok(response) => println!("{} -> {}", line, response),
            Err(err) => println!("{} -> error: {}", line, err),
        }
    }

    println!("Enter commands (GET <key>, PUT <key> <value>, DELETE <key>), or \"exit\" to quit.");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" {
            break;
        }

        match client.submit(line) {
            Ok(response) => println!("{}", response),
            Err(err) => println!("Error: {}", err),
        }
    }

    Ok(())
}
