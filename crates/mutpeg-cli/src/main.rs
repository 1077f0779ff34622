//! Mutant PEG translator CLI.
//!
//! Provides the `mutpeg` binary. The `translate` subcommand reads JSON
//! subject files (an original class plus mutated copies), translates every
//! method into a Program Expression Graph, checks each mutant against its
//! original and writes a JSON report.
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); stdout carries only the
//! final summary so it can be piped into other tools.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mutpeg_core::PegPrinter;
use mutpeg_translate::{Report, Session, TranslateConfig};

/// Mutant equivalence via Program Expression Graphs.
#[derive(Parser)]
#[command(name = "mutpeg", about = "Translate SIMPLE methods and their mutants into PEGs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Translate subject files and write a report.
    Translate {
        /// Subject files (JSON).
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Report destination.
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// Translation settings (JSON); missing keys use defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print every translated root in full form to stderr.
        #[arg(long)]
        print_pegs: bool,

        /// Check that the store is acyclic before each report is built.
        #[arg(long)]
        verify: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Translate {
            inputs,
            output,
            config,
            print_pegs,
            verify,
        } => {
            let exit_code = run_translate(&inputs, &output, config.as_deref(), print_pegs, verify);
            process::exit(exit_code);
        }
    }
}

/// Execute the translate subcommand.
///
/// Returns exit code: 0 = success, 1 = report or verification failure,
/// 3 = I/O error (unreadable config or report). Unreadable or malformed
/// inputs are skipped and counted; the report and summary are still written
/// and the run then exits with 3.
fn run_translate(
    inputs: &[PathBuf],
    output: &Path,
    config_path: Option<&Path>,
    print_pegs: bool,
    verify: bool,
) -> i32 {
    let config = match config_path {
        Some(path) => match TranslateConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 3;
            }
        },
        None => TranslateConfig::default(),
    };

    let mut session = Session::new(config);
    let mut reports = Vec::new();
    let mut pending_inputs = Vec::new();
    let mut failed_inputs = 0usize;

    for input in inputs {
        if let Err(e) = session.load_file(input) {
            warn!(error = %e, "input skipped");
            failed_inputs += 1;
            continue;
        }
        pending_inputs.push(input.display().to_string());

        if config.reset_store_per_file {
            match finish(&mut session, std::mem::take(&mut pending_inputs), print_pegs, verify) {
                Ok(report) => reports.push(report),
                Err(code) => return code,
            }
        }
    }
    if !pending_inputs.is_empty() {
        match finish(&mut session, pending_inputs, print_pegs, verify) {
            Ok(report) => reports.push(report),
            Err(code) => return code,
        }
    }

    match Report::write_all(&reports, output) {
        Ok(()) => info!(path = %output.display(), reports = reports.len(), "report written"),
        Err(mutpeg_translate::ReportError::Io { path, source }) => {
            eprintln!("I/O error: failed to write '{}': {}", path, source);
            return 3;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    }

    // Summary as JSON on stdout for machine-readable output
    match serde_json::to_string_pretty(session.stats()) {
        Ok(json) => {
            println!("{}", json);
            if failed_inputs > 0 {
                eprintln!("Error: {} of {} input(s) could not be read", failed_inputs, inputs.len());
                3
            } else {
                0
            }
        }
        Err(e) => {
            eprintln!("Error: failed to serialize summary: {}", e);
            1
        }
    }
}

/// Closes the current translation unit: optional checks and printing, then
/// the report. The error value is the exit code.
fn finish(
    session: &mut Session,
    inputs: Vec<String>,
    print_pegs: bool,
    verify: bool,
) -> Result<Report, i32> {
    if verify {
        if let Err(e) = session.store().verify_dag() {
            error!(error = %e, "node store failed verification");
            return Err(1);
        }
    }

    if print_pegs {
        for record in session.records() {
            let roots = record
                .root
                .into_iter()
                .map(|root| (record.method.clone(), root))
                .chain(
                    record
                        .mutants
                        .iter()
                        .filter_map(|m| m.root.map(|root| (format!("{} [{}]", record.method, m.id), root))),
                );
            for (label, root) in roots {
                match PegPrinter::new(session.store()).print(root) {
                    Ok(text) => eprintln!("{} {}:\n{}", record.subject, label, text),
                    Err(e) => eprintln!("{} {}: {}", record.subject, label, e),
                }
            }
        }
    }

    session.finish_unit(inputs).map_err(|e| {
        eprintln!("Error: {}", e);
        1
    })
}
