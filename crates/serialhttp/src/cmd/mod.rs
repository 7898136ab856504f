use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod link;
pub mod query;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve line replies over HTTP.
    Serve(ServeArgs),
    /// Run a single exchange and print the reply.
    Query(QueryArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Query(args) => query::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Line endpoint and exchange settings shared by `serve` and `query`.
///
/// Byte values (`--query`, `--header`, `--terminator`) are literal unless
/// prefixed with `hex:`.
#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Serial endpoint: tcp://host:port, unix:/path, or a device path.
    #[arg(env = "SERIALHTTP_ENDPOINT")]
    pub endpoint: String,
    /// Query written to the line before each read.
    #[arg(long, env = "SERIALHTTP_QUERY")]
    pub query: String,
    /// Reply frame header.
    #[arg(long, env = "SERIALHTTP_HEADER")]
    pub header: String,
    /// Reply frame terminator.
    #[arg(long, env = "SERIALHTTP_TERMINATOR")]
    pub terminator: String,
    /// Total reply budget (e.g. 5s, 500ms; bare numbers are milliseconds).
    #[arg(long, default_value = "5s", env = "SERIALHTTP_TIMEOUT")]
    pub timeout: String,
    /// Polls per attempt window on device endpoints.
    #[arg(
        long,
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..),
        env = "SERIALHTTP_POLL_RETRIES"
    )]
    pub poll_retries: u32,
    /// Reject replies that do not match this regular expression.
    #[arg(long, value_name = "REGEX", env = "SERIALHTTP_RESPONSE_PATTERN")]
    pub response_pattern: Option<String>,
    /// Rewrite matching replies (supports $1 / $name references).
    #[arg(
        long,
        requires = "response_pattern",
        env = "SERIALHTTP_RESPONSE_REPLACEMENT"
    )]
    pub response_replacement: Option<String>,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080", env = "SERIALHTTP_BIND")]
    pub bind: String,
    /// Request path answered with line replies.
    #[arg(long, default_value = serialhttp_bridge::http::DEFAULT_PATH, env = "SERIALHTTP_PATH")]
    pub path: String,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub link: LinkArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
