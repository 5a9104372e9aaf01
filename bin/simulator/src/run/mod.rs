use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tickets_config::{ConsumerEntry, ProducerEntry, ReaderEntry, SimulationConfig, WriterEntry};
use tickets_core::{Strategy, TicketPool};
use tickets_workers::{
    Consumer, Ledger, Producer, Reader, Role, StopSignal, Supervisor, WorkerResult, Writer,
};

use crate::BoxedError;

const STATUS_INTERVAL: Duration = Duration::from_secs(1);

const DEFAULT_PRODUCERS: usize = 2;
const DEFAULT_CONSUMERS: usize = 3;
const DEFAULT_WRITERS: usize = 1;
const DEFAULT_READERS: usize = 1;

pub fn register(command: clap::Command) -> clap::Command {
    command.subcommand(
        clap::Command::new("run")
            .about("Runs every role against one pool and prints its status every second")
            .arg(
                clap::Arg::new("config")
                    .long("config")
                    .short('c')
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(String))
                    .help("simulation TOML file, flags below override its values"),
            )
            .arg(
                clap::Arg::new("capacity")
                    .long("capacity")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                clap::Arg::new("strategy")
                    .long("strategy")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(String))
                    .help("monitor, locked or queued"),
            )
            .arg(count_arg("producers"))
            .arg(count_arg("consumers"))
            .arg(count_arg("writers"))
            .arg(count_arg("readers"))
            .arg(
                clap::Arg::new("duration_secs")
                    .long("duration-secs")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(u64))
                    .help("0 runs until every worker is done or Ctrl-C"),
            )
            .arg(
                clap::Arg::new("wait_timeout_ms")
                    .long("wait-timeout-ms")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(u64)),
            ),
    )
}

fn count_arg(role: &'static str) -> clap::Arg {
    clap::Arg::new(role)
        .long(role)
        .action(clap::ArgAction::Set)
        .value_parser(clap::value_parser!(usize))
}

pub fn run(args: &clap::ArgMatches) -> std::result::Result<(), BoxedError> {
    let config = resolve_config(args)?;
    config.validate()?;

    tracing::info!(
        "Starting a {} pool of capacity {} for {}s",
        config.strategy,
        config.capacity,
        config.duration_secs
    );

    let pool = config.strategy.build_with(config.pool_config())?;
    let ledger = Arc::new(Ledger::new());
    let mut supervisor = Supervisor::new();
    spawn_roles(&config, &pool, &ledger, &mut supervisor)?;

    let interrupted = Arc::new(StopSignal::new());
    let handler = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl-C, shutting down");
        handler.stop();
    })?;

    let deadline = match config.duration() {
        Duration::ZERO => None,
        limit => Some(Instant::now() + limit),
    };

    loop {
        let pause = match deadline {
            Some(at) => STATUS_INTERVAL.min(at.saturating_duration_since(Instant::now())),
            None => STATUS_INTERVAL,
        };
        if !interrupted.sleep(pause) {
            break;
        }

        println!("{}", pool.status());

        if deadline.is_some_and(|at| Instant::now() >= at) {
            tracing::info!("Simulation time is up");
            break;
        }
        if supervisor.running() == 0 {
            tracing::info!("Every worker is done");
            break;
        }
    }

    supervisor.stop_all();
    pool.close();
    let reports = supervisor.join_all();

    println!();
    for report in &reports {
        println!("{report}");
    }
    println!();
    println!("{}", ledger.snapshot());
    println!("{}", pool.status());

    Ok(())
}

/// Loads `--config` when given, then applies the flags on top.
///
/// Without a file every role gets its default entry.
fn resolve_config(args: &clap::ArgMatches) -> std::result::Result<SimulationConfig, BoxedError> {
    let mut config = match args.get_one::<String>("config") {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig {
            producers: vec![ProducerEntry {
                count: DEFAULT_PRODUCERS,
                ..ProducerEntry::default()
            }],
            consumers: vec![ConsumerEntry {
                count: DEFAULT_CONSUMERS,
                ..ConsumerEntry::default()
            }],
            writers: vec![WriterEntry {
                count: DEFAULT_WRITERS,
                ..WriterEntry::default()
            }],
            readers: vec![ReaderEntry {
                count: DEFAULT_READERS,
                ..ReaderEntry::default()
            }],
            ..SimulationConfig::default()
        },
    };

    if let Some(capacity) = args.get_one::<usize>("capacity") {
        config.capacity = *capacity;
    }
    if let Some(strategy) = args.get_one::<String>("strategy") {
        config.strategy = Strategy::from_str(strategy)?;
    }
    if let Some(secs) = args.get_one::<u64>("duration_secs") {
        config.duration_secs = *secs;
    }
    if let Some(millis) = args.get_one::<u64>("wait_timeout_ms") {
        config.wait_timeout_ms = *millis;
    }

    override_count(&mut config.producers, args.get_one::<usize>("producers"), |entry| {
        &mut entry.count
    });
    override_count(&mut config.consumers, args.get_one::<usize>("consumers"), |entry| {
        &mut entry.count
    });
    override_count(&mut config.writers, args.get_one::<usize>("writers"), |entry| {
        &mut entry.count
    });
    override_count(&mut config.readers, args.get_one::<usize>("readers"), |entry| {
        &mut entry.count
    });

    Ok(config)
}

/// Collapses a role table into one entry started `count` times.
///
/// The first configured entry is kept as the template.
fn override_count<E, F>(entries: &mut Vec<E>, count: Option<&usize>, count_of: F)
where
    E: Clone + Default,
    F: Fn(&mut E) -> &mut usize,
{
    let Some(&count) = count else {
        return;
    };

    let mut template = entries.first().cloned().unwrap_or_default();
    *count_of(&mut template) = count;
    entries.clear();
    if count > 0 {
        entries.push(template);
    }
}

fn spawn_roles(
    config: &SimulationConfig,
    pool: &Arc<dyn TicketPool>,
    ledger: &Arc<Ledger>,
    supervisor: &mut Supervisor,
) -> WorkerResult<()> {
    for entry in &config.producers {
        for n in 0..entry.count {
            let mut entry = entry.clone();
            if entry.count > 1 {
                entry.vendor_name = format!("{}-{}", entry.vendor_name, n + 1);
            }
            supervisor.spawn(Producer::new(
                worker_name(supervisor, Role::Producer),
                Arc::clone(pool),
                Arc::clone(ledger),
                entry.pacing(),
                entry.payload(),
            ))?;
        }
    }

    for entry in &config.consumers {
        for _ in 0..entry.count {
            supervisor.spawn(Consumer::new(
                worker_name(supervisor, Role::Consumer),
                Arc::clone(pool),
                Arc::clone(ledger),
                entry.pacing(),
                entry.payload(),
            ))?;
        }
    }

    for entry in &config.writers {
        for _ in 0..entry.count {
            supervisor.spawn(Writer::new(
                worker_name(supervisor, Role::Writer),
                Arc::clone(pool),
                Arc::clone(ledger),
                entry.pacing(),
                entry.update(),
            ))?;
        }
    }

    for entry in &config.readers {
        for _ in 0..entry.count {
            supervisor.spawn(Reader::new(
                worker_name(supervisor, Role::Reader),
                Arc::clone(pool),
                Arc::clone(ledger),
                entry.pacing(),
            ))?;
        }
    }

    tracing::info!("Started {} workers", supervisor.running());
    Ok(())
}

/// Matches the thread name the supervisor gives the next worker of `role`.
fn worker_name(supervisor: &Supervisor, role: Role) -> String {
    format!("{role}-{}", supervisor.count(role) + 1)
}
