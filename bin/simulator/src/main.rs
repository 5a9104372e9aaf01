mod run;
mod stress;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn main() -> std::result::Result<(), BoxedError> {
    let commander = stress::register(run::register(
        clap::Command::new("tickets")
            .about("Simulates producers, consumers, writers and readers sharing a ticket pool")
            .arg_required_else_help(true)
            .arg(
                clap::Arg::new("verbose")
                    .long("verbose")
                    .short('v')
                    .global(true)
                    .action(clap::ArgAction::SetTrue)
                    .help("log pool waits and wakeups"),
            ),
    ));

    let matches = commander.get_matches();

    let level = if matches.get_flag("verbose") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_thread_names(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match matches.subcommand() {
        Some(("run", arguments)) => run::run(arguments)?,
        Some(("stress", arguments)) => stress::run(arguments)?,
        _ => {}
    }

    Ok(())
}
