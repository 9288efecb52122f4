use logrelay_client::{read_with_retry, ReadOutcome};
use tracing::info;

use crate::cmd::ReadArgs;
use crate::exit::{client_error, CliResult, SUCCESS};

pub async fn run(args: ReadArgs) -> CliResult<i32> {
    let client = args.client.http_client()?;
    let mut stdout = tokio::io::stdout();

    match read_with_retry(&client, &args.url, &mut stdout, &args.client.policy()).await {
        Ok(ReadOutcome::Completed { bytes }) => {
            info!(url = %args.url, bytes, "channel finished");
        }
        Ok(ReadOutcome::ChannelNotFound) => {
            info!(url = %args.url, "nothing to read");
        }
        Err(err) => return Err(client_error("read failed", err)),
    }
    Ok(SUCCESS)
}
