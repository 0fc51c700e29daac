//! flagbind CLI - Resolve layered configuration and report where each value came from.

use clap::{CommandFactory, FromArgMatches};
use flagbind::cli::{Cli, Commands};
use flagbind::commands::{self, Output};
use std::process;
use tracing_subscriber::EnvFilter;

/// Log filter, e.g. `FLAGBIND_LOG=flagbind=trace`.
const LOG_ENV: &str = "FLAGBIND_LOG";
/// Set to `json` for structured log lines.
const LOG_FORMAT_ENV: &str = "FLAGBIND_LOG_FORMAT";

fn main() {
    init_tracing();

    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    let human = cli.human_readable;

    if let Err(e) = run(&cli, &matches, human) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

fn run(cli: &Cli, matches: &clap::ArgMatches, human: bool) -> flagbind::Result<()> {
    let session = commands::build_resolver(cli, matches)?;

    match cli.command {
        None | Some(Commands::Show) => output(&commands::show(&session)?, human),
        Some(Commands::Get { ref key }) => output(&commands::get(&session, key)?, human),
        Some(Commands::Keys) => output(&commands::keys(&session), human),
    }

    Ok(())
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var(LOG_FORMAT_ENV).is_ok_and(|f| f == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
}
