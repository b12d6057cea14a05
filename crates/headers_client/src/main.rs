use std::env;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use headers_client::config::{ENV_API_KEY, ENV_URL};
use headers_client::{BlockHash, ClientConfig, ForkPolicy, HeadersClient};
use serde::Serialize;
use serde_json::json;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "headers-client")]
#[command(about = "Query a block header service for longest-chain headers", long_about = None)]
struct Args {
    /// Header service base URL (defaults to $HEADERS_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Bearer credential (defaults to $HEADERS_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Fail instead of guessing when no header at a height is labelled longest chain
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current longest-chain tip
    Tip,
    /// Print one header, by height (longest chain) or by hash
    Header {
        #[arg(long, conflicts_with = "hash", required_unless_present = "hash")]
        height: Option<u32>,
        #[arg(long)]
        hash: Option<BlockHash>,
    },
    /// Rebuild the longest-chain run starting at a height
    Range {
        #[arg(long)]
        from: u32,
        #[arg(long)]
        count: u32,
    },
    /// Check a merkle root against the longest-chain header at a height
    VerifyRoot {
        #[arg(long)]
        root: BlockHash,
        #[arg(long)]
        height: u32,
    },
    /// Follow the chain tip and print every change until interrupted
    Watch,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(args: &Args) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = ClientConfig::from_lookup(|name| {
        let flag = match name {
            ENV_URL => args.url.clone(),
            ENV_API_KEY => args.api_key.clone(),
            _ => None,
        };
        flag.or_else(|| env::var(name).ok())
    })?;
    if args.strict {
        config.fork_policy = ForkPolicy::Strict;
    }
    Ok(config)
}

async fn watch(client: &HeadersClient) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let subscription = client.start_tip_subscription(cancel.clone()).await;
    let Some(mut subscriber) = client.subscribe().await else {
        return Err("tip notifications already claimed".into());
    };

    let finished = subscription.join();
    tokio::pin!(finished);

    loop {
        select! {
            result = &mut finished => {
                return match result {
                    Ok(()) => Ok(ExitCode::SUCCESS),
                    Err(e) => {
                        error!(error = %e, "tip subscription stopped");
                        Ok(ExitCode::FAILURE)
                    }
                };
            }
            Some(tip) = subscriber.recv() => print_json(&tip)?,
            _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                info!("interrupt received, stopping tip subscription");
                cancel.cancel();
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("hyper_util=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    let client = HeadersClient::from_config(&config)?;

    match args.command {
        Command::Tip => print_json(&client.refresh_tip().await?)?,
        Command::Header { height: Some(height), .. } => {
            print_json(&client.header_at_height(height).await?)?
        }
        Command::Header { hash: Some(hash), .. } => {
            print_json(&client.header_by_hash(&hash).await?)?
        }
        Command::Header { .. } => return Err("either --height or --hash is required".into()),
        Command::Range { from, count } => {
            print_json(&client.headers_in_range(from, count).await?)?
        }
        Command::VerifyRoot { root, height } => {
            let valid = client.is_valid_root_for_height(&root, height).await?;
            print_json(&json!({ "height": height, "root": root, "valid": valid }))?;
            if !valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Watch => return watch(&client).await,
    }

    Ok(ExitCode::SUCCESS)
}
