use std::time::Duration;

use tickets_core::Strategy;
use tickets_testing::scenarios::{compare_strategies, run_mixed_roles, Scenario};
use tickets_testing::{Reporter, StressConfig};

use crate::BoxedError;

pub fn register(command: clap::Command) -> clap::Command {
    command.subcommand(
        clap::Command::new("stress")
            .about("Runs one stress scenario against every strategy and compares them")
            .arg(
                clap::Arg::new("threads")
                    .long("threads")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize))
                    .default_value("8"),
            )
            .arg(
                clap::Arg::new("iterations")
                    .long("iterations")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize))
                    .default_value("1000"),
            )
            .arg(
                clap::Arg::new("capacity")
                    .long("capacity")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize))
                    .default_value("100"),
            )
            .arg(
                clap::Arg::new("wait_timeout_ms")
                    .long("wait-timeout-ms")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(u64))
                    .default_value("50"),
            )
            .arg(
                clap::Arg::new("scenario")
                    .long("scenario")
                    .action(clap::ArgAction::Set)
                    .value_parser(["contention", "producer-consumer", "mixed"])
                    .default_value("contention"),
            ),
    )
}

pub fn run(args: &clap::ArgMatches) -> std::result::Result<(), BoxedError> {
    let threads = *args.get_one::<usize>("threads").unwrap_or(&8);
    let iterations = *args.get_one::<usize>("iterations").unwrap_or(&1000);
    let capacity = *args.get_one::<usize>("capacity").unwrap_or(&100);
    let wait_timeout = *args.get_one::<u64>("wait_timeout_ms").unwrap_or(&50);

    let config = StressConfig::new()
        .threads(threads)
        .iterations(iterations)
        .capacity(capacity)
        .wait_timeout(Duration::from_millis(wait_timeout));

    let scenario = match args.get_one::<String>("scenario").map(String::as_str) {
        Some("producer-consumer") => Scenario::ProducerConsumer,
        Some("mixed") => return run_mixed(config),
        _ => Scenario::PurchaseContention,
    };

    let reports = compare_strategies(config, scenario)?;
    for report in &reports {
        println!("{}", report.to_string_pretty());
    }
    println!("{}", Reporter::comparison_table(&reports));

    if let Some(fastest) = Reporter::fastest(&reports) {
        tracing::info!("Fastest strategy for {scenario}: {}", fastest.strategy());
    }

    Ok(())
}

fn run_mixed(config: StressConfig) -> std::result::Result<(), BoxedError> {
    for strategy in Strategy::ALL {
        tracing::info!("Running mixed roles against the {strategy} strategy");

        let pool = strategy.build_with(config.pool_config())?;
        let outcome = run_mixed_roles(&pool, config)?;

        println!("{}", outcome.ledger);
        println!("{} in {:?}", outcome.status, outcome.duration);
        println!();
    }

    Ok(())
}
