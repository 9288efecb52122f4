use logrelay_server::{RelayServer, ServerConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cmd::{parse_duration, parse_listen, ServerArgs};
use crate::exit::{server_error, CliError, CliResult, SUCCESS, USAGE};

pub async fn run(args: ServerArgs) -> CliResult<i32> {
    let config = server_config(&args)?;
    let server = RelayServer::new(config);
    let config = server.config();
    info!(
        listen = %config.listen,
        grace_ms = config.grace.as_millis() as u64,
        sweep_interval_s = config.sweep_interval.as_secs(),
        chunk_size = config.chunk_size,
        "starting relay server"
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                on_interrupt.cancel();
            }
            Err(err) => warn!(error = %err, "interrupt handler unavailable"),
        }
    });

    server
        .run(cancel)
        .await
        .map_err(|err| server_error("server failed", err))?;
    Ok(SUCCESS)
}

fn server_config(args: &ServerArgs) -> CliResult<ServerConfig> {
    if args.chunk_size == 0 {
        return Err(CliError::new(USAGE, "chunk size must be greater than zero"));
    }
    Ok(ServerConfig {
        listen: parse_listen(&args.listen)?,
        grace: parse_duration(&args.grace)?,
        sweep_interval: parse_duration(&args.sweep_interval)?,
        chunk_size: args.chunk_size,
        poll_interval: parse_duration(&args.poll_interval)?,
        binary_path: args.binary.clone(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn args(listen: &str) -> ServerArgs {
        ServerArgs {
            listen: listen.to_string(),
            grace: "5s".to_string(),
            sweep_interval: "60s".to_string(),
            chunk_size: 50,
            poll_interval: "10ms".to_string(),
            binary: None,
        }
    }

    #[test]
    fn builds_config_from_defaults() {
        let config = server_config(&args(":8080")).expect("defaults should be valid");
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.grace, Duration::from_secs(5));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_millis(10));
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let mut args = args(":8080");
        args.chunk_size = 0;
        assert_eq!(server_config(&args).unwrap_err().code, USAGE);
    }

    #[test]
    fn rejects_zero_sweep_interval() {
        let mut args = args(":8080");
        args.sweep_interval = "0s".to_string();
        assert_eq!(server_config(&args).unwrap_err().code, USAGE);
    }
}
