use std::{fs, io::Write, panic, path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Ingest the network description and write the binary snapshot.
    #[value(name = "make_base")]
    MakeBase,
    /// Load the snapshot and answer the stat request batch.
    #[value(name = "process_requests")]
    ProcessRequests,
}

/// Two-phase transport catalogue: build a snapshot, then answer queries
/// against it.
#[derive(Debug, Parser)]
#[command(name = "omnibus")]
struct Args {
    #[arg(value_enum)]
    mode: Mode,
    /// Path to the input JSON document.
    input: PathBuf,
}

// Exit codes, in the order the pipeline can fail.
const EXIT_BAD_COMMAND: u8 = 1;
const EXIT_INPUT_NOT_FOUND: u8 = 2;
const EXIT_INPUT_UNREADABLE: u8 = 3;
const EXIT_OUTPUT_UNCREATABLE: u8 = 4;
const EXIT_REQUEST_ERROR: u8 = 5;
const EXIT_UNKNOWN: u8 = 6;

struct Failure {
    code: u8,
    message: String,
}

impl Failure {
    fn new(code: u8, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

fn main() -> ExitCode {
    // Stdout carries the response document; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    ExitCode::SUCCESS
                }
                _ => ExitCode::from(EXIT_BAD_COMMAND),
            };
        }
    };

    match panic::catch_unwind(|| run(args)) {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(failure)) => {
            error!("{}", failure.message);
            ExitCode::from(failure.code)
        }
        Err(_) => ExitCode::from(EXIT_UNKNOWN),
    }
}

fn run(args: Args) -> Result<(), Failure> {
    if !args.input.exists() {
        return Err(Failure::new(
            EXIT_INPUT_NOT_FOUND,
            format!("input file {:?} not found", args.input),
        ));
    }
    let input = fs::read_to_string(&args.input).map_err(|err| {
        Failure::new(
            EXIT_INPUT_UNREADABLE,
            format!("cannot read {:?}: {err}", args.input),
        )
    })?;

    match args.mode {
        Mode::MakeBase => omnibus::request::make_base(&input)
            .map_err(|err| Failure::new(EXIT_REQUEST_ERROR, err.to_string())),
        Mode::ProcessRequests => {
            let out_path = args.input.with_extension("out");
            let mut out_file = fs::File::create(&out_path).map_err(|err| {
                Failure::new(
                    EXIT_OUTPUT_UNCREATABLE,
                    format!("cannot create {out_path:?}: {err}"),
                )
            })?;

            let responses = omnibus::request::process_requests(&input)
                .map_err(|err| Failure::new(EXIT_REQUEST_ERROR, err.to_string()))?;
            let rendered = serde_json::to_string_pretty(&responses)
                .map_err(|err| Failure::new(EXIT_REQUEST_ERROR, err.to_string()))?;

            println!("{rendered}");
            out_file
                .write_all(rendered.as_bytes())
                .and_then(|()| writeln!(out_file))
                .map_err(|err| {
                    Failure::new(
                        EXIT_OUTPUT_UNCREATABLE,
                        format!("cannot write {out_path:?}: {err}"),
                    )
                })
        }
    }
}
