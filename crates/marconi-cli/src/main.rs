use clap::{ArgAction, Parser, Subcommand};
use marconi_client::{ClientId, MessageApi, MessageDraft, QueueClientConfig, StreamOptions};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "marconi-cli")]
#[command(about = "Command-line host for Marconi queue messages")]
struct Cli {
    /// Service endpoint including the version segment, e.g. http://host:8888/v1
    #[arg(long, global = true)]
    endpoint: Option<String>,
    #[arg(long, global = true)]
    queue: Option<String>,
    #[arg(long, global = true)]
    client_id_file: Option<PathBuf>,
    /// Used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Create(CreateArgs),
    Stream(StreamArgs),
    List(IdsArgs),
    Get(GetArgs),
    Delete(IdsArgs),
}

#[derive(clap::Args, Debug)]
struct CreateArgs {
    /// Message body; parsed as JSON when possible, otherwise sent as a string.
    #[arg(long = "body", required = true)]
    bodies: Vec<String>,
    #[arg(long, default_value_t = 300)]
    ttl: u32,
}

#[derive(clap::Args, Debug)]
struct StreamArgs {
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    marker: Option<String>,
    #[arg(long, action = ArgAction::SetTrue)]
    echo: bool,
    #[arg(long, action = ArgAction::SetTrue)]
    include_claimed: bool,
    /// Keep polling for newer pages and print one message per line.
    #[arg(long, action = ArgAction::SetTrue)]
    follow: bool,
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
}

#[derive(clap::Args, Debug)]
struct IdsArgs {
    #[arg(long = "id", required = true)]
    ids: Vec<String>,
}

#[derive(clap::Args, Debug)]
struct GetArgs {
    #[arg(long)]
    id: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(cli: Cli) -> Result<ExitCode, String> {
    let mut config = QueueClientConfig::from_env().map_err(|error| error.to_string())?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(queue) = cli.queue {
        config.queue = Some(queue);
    }
    if let Some(path) = cli.client_id_file {
        config.client_id_file = path;
    }

    let api = config.message_api().map_err(|error| error.to_string())?;
    let client_id = config.client_id().map_err(|error| error.to_string())?;
    tracing::debug!(queue_url = api.queue_url(), %client_id, "queue client ready");

    match cli.command {
        Commands::Create(args) => create_command(&api, client_id, args).await,
        Commands::Stream(args) => stream_command(&api, client_id, args).await,
        Commands::List(args) => list_command(&api, client_id, args).await,
        Commands::Get(args) => get_command(&api, client_id, args).await,
        Commands::Delete(args) => delete_command(&api, client_id, args).await,
    }
}

async fn create_command(
    api: &MessageApi,
    client_id: ClientId,
    args: CreateArgs,
) -> Result<ExitCode, String> {
    let drafts: Vec<MessageDraft> = args
        .bodies
        .iter()
        .map(|raw| MessageDraft::new(parse_body(raw), args.ttl))
        .collect();
    let created = api
        .create(client_id, &drafts)
        .await
        .map_err(|error| error.to_string())?;
    print_json(&json!(created))?;
    Ok(ExitCode::SUCCESS)
}

async fn stream_command(
    api: &MessageApi,
    client_id: ClientId,
    args: StreamArgs,
) -> Result<ExitCode, String> {
    let mut options = StreamOptions::new();
    if let Some(limit) = args.limit {
        options = options.limit(limit);
    }
    if let Some(marker) = args.marker {
        options = options.marker(marker);
    }
    if args.echo {
        options = options.echo(true);
    }
    if args.include_claimed {
        options = options.include_claimed(true);
    }

    if !args.follow {
        let page = api
            .stream(client_id, Some(&options))
            .await
            .map_err(|error| error.to_string())?;
        print_json(&json!(page))?;
        return Ok(ExitCode::SUCCESS);
    }

    let interval = Duration::from_millis(args.interval_ms);
    loop {
        let page = api
            .stream(client_id, Some(&options))
            .await
            .map_err(|error| error.to_string())?;
        if page.is_empty() {
            tokio::time::sleep(interval).await;
            continue;
        }
        for message in page.iter() {
            let line = serde_json::to_string(message).map_err(|error| error.to_string())?;
            println!("{line}");
        }
        match page.next_marker() {
            Some(marker) => options = options.marker(marker),
            None => {
                tracing::debug!("page has no next link, stopping");
                return Ok(ExitCode::SUCCESS);
            }
        }
    }
}

async fn list_command(
    api: &MessageApi,
    client_id: ClientId,
    args: IdsArgs,
) -> Result<ExitCode, String> {
    let messages = api
        .list(client_id, &args.ids)
        .await
        .map_err(|error| error.to_string())?;
    print_json(&json!(messages))?;
    Ok(ExitCode::SUCCESS)
}

async fn get_command(
    api: &MessageApi,
    client_id: ClientId,
    args: GetArgs,
) -> Result<ExitCode, String> {
    let message = api
        .get(client_id, &args.id)
        .await
        .map_err(|error| error.to_string())?;
    print_json(&json!(message))?;
    Ok(ExitCode::SUCCESS)
}

async fn delete_command(
    api: &MessageApi,
    client_id: ClientId,
    args: IdsArgs,
) -> Result<ExitCode, String> {
    let deleted = api
        .delete(client_id, &args.ids)
        .await
        .map_err(|error| error.to_string())?;
    print_json(&json!({ "deleted": deleted }))?;
    Ok(ExitCode::SUCCESS)
}

fn parse_body(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_json(value: &Value) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|error| error.to_string())?;
    println!("{json}");
    Ok(())
}
