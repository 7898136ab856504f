mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "serialhttp", version, about = "Serial line to HTTP bridge")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true, env = "SERIALHTTP_FORMAT")]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        global = true,
        env = "SERIALHTTP_LOG_FORMAT"
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        global = true,
        env = "SERIALHTTP_LOG_LEVEL"
    )]
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
    fn parses_query_subcommand() {
        let cli = Cli::try_parse_from([
            "serialhttp",
            "query",
            "tcp://127.0.0.1:4001",
            "--query",
            "READ?",
            "--header",
            "<<",
            "--terminator",
            ">>",
            "--timeout",
            "2s",
        ])
        .expect("query args should parse");

        let Command::Query(args) = cli.command else {
            panic!("expected query command");
        };
        assert_eq!(args.link.endpoint, "tcp://127.0.0.1:4001");
        assert_eq!(args.link.timeout, "2s");
        assert_eq!(args.link.poll_retries, 5);
    }

    #[test]
    fn parses_serve_subcommand_with_defaults() {
        let cli = Cli::try_parse_from([
            "serialhttp",
            "serve",
            "/dev/ttyUSB0",
            "--query",
            "hex:0D",
            "--header",
            "[",
            "--terminator",
            "]",
        ])
        .expect("serve args should parse");

        let Command::Serve(args) = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(args.bind, "127.0.0.1:8080");
        assert_eq!(args.path, "/serialToHttp/");
    }

    #[test]
    fn replacement_requires_pattern() {
        let err = Cli::try_parse_from([
            "serialhttp",
            "query",
            "tcp://127.0.0.1:4001",
            "--query",
            "READ?",
            "--header",
            "<<",
            "--terminator",
            ">>",
            "--response-replacement",
            "$1",
        ])
        .expect_err("replacement without pattern should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn rejects_zero_poll_retries() {
        let err = Cli::try_parse_from([
            "serialhttp",
            "query",
            "/dev/ttyS0",
            "--query",
            "?",
            "--header",
            "<",
            "--terminator",
            ">",
            "--poll-retries",
            "0",
        ])
        .expect_err("zero retries should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
