//! glean - structured records from saved search and maps pages

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use glean::cli::{Cli, Commands};
use glean::error::Result;
use glean::Enrichment;

mod commands;

/// Exit status for a challenge page, distinct from ordinary failures
const EXIT_BLOCKED: i32 = 2;

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        if let Some(hint) = e.hint() {
            eprintln!("{} {}", "Hint:".yellow(), hint);
        }
        std::process::exit(if e.is_challenge() { EXIT_BLOCKED } else { 1 });
    }
}

/// Logs go to stderr so `--json` output on stdout stays clean
fn init_logging() {
    let filter = EnvFilter::try_from_env("GLEAN_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("glean=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Places {
            file,
            limit,
            cursor,
            no_hours,
            no_contact,
            no_coordinates,
            no_categories,
            json,
        } => {
            let enrich = Enrichment {
                hours: !no_hours,
                contact: !no_contact,
                coordinates: !no_coordinates,
                categories: !no_categories,
            };
            commands::cmd_places(&file, limit, cursor, enrich, json)
        }

        Commands::Search {
            file,
            only,
            limit,
            cursor,
            json,
        } => commands::cmd_search(&file, only, limit, cursor, json),

        Commands::Inspect { file, json } => commands::cmd_inspect(&file, json),

        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}
