use logrelay_client::{write_with_retry, ReadOnlySource};
use tracing::info;

use crate::cmd::WriteArgs;
use crate::exit::{client_error, CliResult, SUCCESS};

pub async fn run(args: WriteArgs) -> CliResult<i32> {
    let client = args.client.http_client()?;
    let source = ReadOnlySource::new(tokio::io::stdin());

    let attempts = write_with_retry(&client, &args.url, &source, &args.client.policy())
        .await
        .map_err(|err| client_error("write failed", err))?;
    info!(url = %args.url, attempts, "input relayed");
    Ok(SUCCESS)
}
