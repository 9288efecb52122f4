mod cmd;
mod exit;
mod logging;

use clap::Parser;

use crate::cmd::Command;
use crate::exit::{CliError, INTERNAL};
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "logrelay", version, about = "HTTP log stream relay")]
struct Cli {
    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        env = "LOGRELAY_LOG_FORMAT",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "LOGRELAY_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("runtime setup failed: {err}")))
        .and_then(|runtime| runtime.block_on(cmd::run(cli.command)));

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
    fn parses_server_subcommand_with_tuning() {
        let cli = Cli::try_parse_from([
            "logrelay",
            "server",
            ":8080",
            "--grace",
            "2s",
            "--sweep-interval",
            "30s",
            "--chunk-size",
            "64",
        ])
        .expect("server args should parse");

        match cli.command {
            Command::Server(args) => {
                assert_eq!(args.listen, ":8080");
                assert_eq!(args.grace, "2s");
                assert_eq!(args.sweep_interval, "30s");
                assert_eq!(args.chunk_size, 64);
                assert_eq!(args.poll_interval, "10ms");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_write_and_read_with_default_retries() {
        let cli = Cli::try_parse_from(["logrelay", "write", "http://relay:8080/log/printer"])
            .expect("write args should parse");
        match cli.command {
            Command::Write(args) => assert_eq!(args.client.max_retries, 12),
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from([
            "logrelay",
            "read",
            "http://relay:8080/log/printer",
            "--max-retries",
            "3",
        ])
        .expect("read args should parse");
        match cli.command {
            Command::Read(args) => assert_eq!(args.client.max_retries, 3),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_log_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "logrelay",
            "version",
            "--log-format",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("global flags should parse after the subcommand");
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(cli.log_level, LogLevel::Debug));
    }

    #[test]
    fn rejects_missing_url() {
        let err = Cli::try_parse_from(["logrelay", "read"]).expect_err("url is required");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
