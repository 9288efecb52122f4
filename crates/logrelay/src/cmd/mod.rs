use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use logrelay_client::{RetryPolicy, DEFAULT_MAX_RETRIES};

use crate::exit::{CliError, CliResult, INTERNAL, USAGE};

pub mod read;
pub mod server;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the relay server.
    Server(ServerArgs),
    /// Stream stdin into a channel.
    Write(WriteArgs),
    /// Stream a channel to stdout until it is finalized.
    Read(ReadArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Server(args) => server::run(args).await,
        Command::Write(args) => write::run(args).await,
        Command::Read(args) => read::run(args).await,
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Address to listen on (`host:port`, or `:port` for all interfaces).
    #[arg(env = "LOGRELAY_LISTEN")]
    pub listen: String,
    /// How long a finished channel waits for its writer to reconnect while a reader is attached.
    #[arg(long, default_value = "5s", env = "LOGRELAY_GRACE")]
    pub grace: String,
    /// Period of the eviction sweep.
    #[arg(long, default_value = "60s", env = "LOGRELAY_SWEEP_INTERVAL")]
    pub sweep_interval: String,
    /// Bytes appended to a channel per buffer lock on the write path.
    #[arg(long, default_value_t = 50, env = "LOGRELAY_CHUNK_SIZE")]
    pub chunk_size: usize,
    /// Pause between drains while a reader waits for data.
    #[arg(long, default_value = "10ms", env = "LOGRELAY_POLL_INTERVAL")]
    pub poll_interval: String,
    /// File served at /dl/client. Default: this executable.
    #[arg(long, value_name = "PATH", env = "LOGRELAY_BINARY")]
    pub binary: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Retries after the first attempt on transient failures.
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES, env = "LOGRELAY_MAX_RETRIES")]
    pub max_retries: u32,
    /// TCP connect timeout per attempt (e.g. 10s, 500ms).
    #[arg(long, default_value = "10s", env = "LOGRELAY_CONNECT_TIMEOUT")]
    pub connect_timeout: String,
}

impl ClientArgs {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_retries(self.max_retries)
    }

    pub fn http_client(&self) -> CliResult<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(parse_duration(&self.connect_timeout)?)
            .build()
            .map_err(|err| CliError::new(INTERNAL, format!("http client setup failed: {err}")))
    }
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Channel URL, e.g. http://relay:8080/log/printer?boot-3
    pub url: String,
    #[command(flatten)]
    pub client: ClientArgs,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Channel URL, e.g. http://relay:8080/log/printer
    pub url: String,
    #[command(flatten)]
    pub client: ClientArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `<digits><unit>` where unit is `ms`, `s`, or `m`; a bare number is seconds.
///
/// Zero is rejected: every duration here is a period or a timeout.
pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(split);
    if digits.is_empty() {
        return Err(CliError::new(
            USAGE,
            format!("invalid duration value: {input:?}"),
        ));
    }

    let value: u64 = digits
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("duration out of range: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "" | "s" => Ok(Duration::from_secs(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| CliError::new(USAGE, format!("duration out of range: {input}"))),
        other => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit {other:?} (expected ms, s or m)"),
        )),
    }
}

/// Parse `host:port`, or `:port` meaning every interface.
pub(crate) fn parse_listen(input: &str) -> CliResult<SocketAddr> {
    let input = input.trim();
    let full = match input.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => input.to_string(),
    };
    full.parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid listen address: {input}")))
}
