mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "sidechan", version, about = "Side-channel demultiplexer CLI")]
struct Cli {
    /// Output format for `inspect`.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). `SIDECHAN_LOG` overrides with a filter.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_demux_with_window() {
        let cli = Cli::try_parse_from([
            "sidechan",
            "demux",
            "/tmp/stderr.log",
            "--quiet-window",
            "500ms",
            "--termination",
            "rearm",
        ])
        .expect("demux args should parse");

        match cli.command {
            Command::Demux(args) => {
                assert_eq!(args.quiet_window, "500ms");
                assert_eq!(args.fatal_codes, vec!["MODULE_NOT_FOUND".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_repeated_fatal_codes() {
        let cli = Cli::try_parse_from([
            "sidechan",
            "demux",
            "--fatal-code",
            "MODULE_NOT_FOUND,ERR_REQUIRE_ESM",
        ])
        .expect("fatal codes should parse");

        match cli.command {
            Command::Demux(args) => {
                assert!(args.input.is_none());
                assert_eq!(args.fatal_codes.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_code_without_error_emit() {
        let err = Cli::try_parse_from(["sidechan", "emit", "log", "x", "--code", "E"])
            .expect_err("log has no --code");
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn parses_inspect_with_format() {
        let cli = Cli::try_parse_from(["sidechan", "--format", "json", "inspect", "-"])
            .expect("inspect args should parse");
        assert!(matches!(cli.command, Command::Inspect(_)));
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }
}
