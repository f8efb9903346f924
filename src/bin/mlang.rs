//! # mlang
//!
//! Command-line front-end for the interpreter: reads a source file, runs it,
//! and prints its output followed by any diagnostics.

use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use log::{debug, error};
use mumps_interp::{evaluate, Diagnostic};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// The path to the source file to run.
    #[arg(index = 1)]
    file: PathBuf,

    /// Increase logging verbosity (repeatable: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print diagnostics as JSON instead of `line:column: message` text.
    #[arg(long)]
    json: bool,
}

fn verbosity_to_level(v: u8) -> log::Level {
    match v {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic], json: bool) {
    if json {
        match serde_json::to_string_pretty(diagnostics) {
            Ok(s) => println!("{s}"),
            Err(e) => error!("failed to serialize diagnostics: {e}"),
        }
        return;
    }
    for d in diagnostics {
        eprintln!("{d}");
    }
}

fn main() -> ExitCode {
    let args = Cli::parse();

    simple_logger::init_with_level(verbosity_to_level(args.verbose)).ok();

    let source = match fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            error!("could not read '{}': {e}", args.file.display());
            return ExitCode::FAILURE;
        }
    };

    debug!("running '{}'", args.file.display());
    let result = evaluate(&source);

    print!("{}", result.output);

    if !result.errors.is_empty() {
        print_diagnostics(&result.errors, args.json);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
