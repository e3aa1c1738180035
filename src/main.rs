//! sperling - A partial-report iconic memory experiment for the terminal
//!
//! Replicates George Sperling's partial-report paradigm: a grid of letters
//! is flashed, optionally followed by a mask, and a tone then tells the
//! participant which row to type back.
//!
//! # Procedure
//!
//! - **Instructions**: shown until the participant presses space
//! - **Trials**: grid, mask (or blank), tone, recall, pause
//! - **Recall**: type the cued row, Backspace to correct, Enter to submit
//! - **Abort**: Escape (or Ctrl+C) ends the session at any point
//!
//! # Files
//!
//! ```text
//! ~/.sperling/config.toml   experiment settings
//! ~/.sperling/results.csv   one row appended per session
//! ~/.sperling/sperling.log  run log
//! ```

mod core;
mod ui;
mod config;
mod record;

use std::env;

use rand::Rng;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::core::session::{SessionController, SessionOutcome};
use crate::record::{ResultRecord, ResultsFile};
use crate::ui::TerminalSurface;

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("sperling {}", VERSION);
}

fn print_help() {
    eprintln!("sperling {} - Partial-report iconic memory experiment", VERSION);
    eprintln!();
    eprintln!("Usage: sperling");
    eprintln!();
    eprintln!("The experiment is configured through a file, not flags.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("During the session:");
    eprintln!("  Space                 Start after the instructions");
    eprintln!("  A-Z, 0-9              Type the cued row");
    eprintln!("  Backspace             Remove the last character");
    eprintln!("  Enter                 Submit (all blanks must be filled)");
    eprintln!("  Esc, Ctrl+C           Stop the session");
    eprintln!();
    eprintln!("Configuration: ~/.sperling/config.toml (or ${})", config::CONFIG_ENV);
    eprintln!("Results:       ~/.sperling/results.csv (one row per session)");
}

fn parse_args() -> Result<(), String> {
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            other => {
                return Err(format!("Unknown argument: {}. Use -h for help.", other));
            }
        }
    }
    Ok(())
}

/// Send tracing output to `~/.sperling/sperling.log` so it never lands on
/// the experiment screen
fn init_logging() {
    let log_path = config::data_dir()
        .map(|dir| dir.join("sperling.log"))
        .unwrap_or_else(|| std::path::PathBuf::from("sperling.log"));

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = parse_args() {
        eprintln!("Error: {}", e);
        eprintln!("Use --help for usage information");
        std::process::exit(1);
    }

    init_logging();
    info!("sperling {} starting...", VERSION);

    // Configuration problems are fatal before any trial runs
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let experiment = match config.validate() {
        Ok(exp) => exp,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(
        "grid {}x{} from {} symbols, {} trials, mask {}, seed {}",
        experiment.rows,
        experiment.cols,
        experiment.alphabet.len(),
        experiment.n_trials,
        if experiment.mask_enabled { "on" } else { "off" },
        seed
    );

    let time_code = record::time_code();

    // Run with guaranteed cleanup
    let mut surface = TerminalSurface::new();
    surface.init()?;
    let result = SessionController::new(&experiment, seed).run(&mut surface);
    let _ = surface.cleanup();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("session failed: {}", e);
            return Err(e.into());
        }
    };

    match outcome {
        SessionOutcome::Finished(session) => {
            eprintln!(
                "correct answers: {}/{}",
                session.trials_correct(),
                session.trials_completed()
            );
            eprintln!("percent correct: {}%", session.percent_correct());

            let record = ResultRecord::new(time_code, &session, &config, seed);
            let results = ResultsFile::new(config.results_path());
            results.append(&record)?;
            info!("results appended to {}", results.path().display());
        }
        SessionOutcome::NoData => {
            warn!("no trials acquired");
            eprintln!("no trials acquired");
        }
    }

    Ok(())
}
