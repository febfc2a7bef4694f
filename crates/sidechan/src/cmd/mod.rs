use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use sidechan_dispatch::TerminationMode;
use sidechan_frame::DEFAULT_READ_CHUNK_SIZE;

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod demux;
pub mod emit;
pub mod inspect;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dispatch a side channel and write the client response to stdout.
    Demux(DemuxArgs),
    /// Parse a side channel and print the messages it carries.
    Inspect(InspectArgs),
    /// Write one side-channel record to stdout.
    Emit(EmitArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Demux(args) => demux::run(args),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Emit(args) => emit::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum TerminationArg {
    /// Every error arms its own timer.
    Independent,
    /// Each error restarts a single timer.
    Rearm,
}

impl From<TerminationArg> for TerminationMode {
    fn from(arg: TerminationArg) -> Self {
        match arg {
            TerminationArg::Independent => TerminationMode::Independent,
            TerminationArg::Rearm => TerminationMode::Rearm,
        }
    }
}

#[derive(Args, Debug)]
pub struct DemuxArgs {
    /// Side-channel capture to read. Default: stdin.
    pub input: Option<PathBuf>,
    /// Delay before ending the response after an error (e.g. 200ms, 1s).
    #[arg(long, env = "SIDECHAN_QUIET_WINDOW", default_value = "200ms")]
    pub quiet_window: String,
    /// How repeated errors interact with the pending termination timer.
    #[arg(long, value_enum, env = "SIDECHAN_TERMINATION", default_value = "independent")]
    pub termination: TerminationArg,
    /// Error codes that end the response immediately (comma-separated).
    #[arg(
        long = "fatal-code",
        env = "SIDECHAN_FATAL_CODE",
        value_delimiter = ',',
        default_value = "MODULE_NOT_FOUND"
    )]
    pub fatal_codes: Vec<String>,
    /// Maximum bytes per chunk.
    #[arg(long, default_value_t = DEFAULT_READ_CHUNK_SIZE)]
    pub chunk_size: usize,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Side-channel capture to read. Default: stdin.
    pub input: Option<PathBuf>,
    /// Maximum bytes per chunk.
    #[arg(long, default_value_t = DEFAULT_READ_CHUNK_SIZE)]
    pub chunk_size: usize,
}

#[derive(Args, Debug)]
pub struct EmitArgs {
    #[command(subcommand)]
    pub record: EmitRecord,
}

#[derive(Subcommand, Debug)]
pub enum EmitRecord {
    /// Signal that the response is complete.
    End,
    /// Emit a log entry. Parsed as JSON when possible, otherwise a string.
    Log { entry: String },
    /// Emit an error for the client.
    Error {
        text: String,
        /// Machine-readable error code, e.g. MODULE_NOT_FOUND.
        #[arg(long)]
        code: Option<String>,
    },
    /// Emit a record of any type.
    Record {
        #[arg(long = "type")]
        msg_type: String,
        /// JSON payload.
        #[arg(long, default_value = "{}")]
        payload: String,
    },
    /// Write plain diagnostic text, as a crashing child would.
    Text { text: String },
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Stdin for `None` or `-`, otherwise the named file.
fn open_input(path: Option<&Path>) -> CliResult<Box<dyn Read>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(std::io::stdin())),
    }
}

/// Parse `200ms`, `2s` or a bare number of milliseconds.
fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis_per_unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, 1)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, 1000)
    } else {
        (input, 1)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    value
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| CliError::new(USAGE, format!("duration out of range: {input}")))
}
