use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use rp_client::observability::metrics;
use rp_client::utils::config_loader;
use rp_client::utils::logging::{self, LogLevel};
use rp_client::{ClientRegistry, RequestOptions};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "rp-client.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// print collected metrics to stderr before exiting, failed calls included
    #[arg(long)]
    print_metrics: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read a resource
    Get(Target),
    /// Delete a resource, waiting for the operation to finish
    Delete(Target),
    /// Create or replace a resource
    Put(WriteArgs),
    /// Update a resource
    Patch(WriteArgs),
    /// Invoke a resource action
    Post(WriteArgs),
}

#[derive(ClapArgs)]
struct Target {
    /// resource path, e.g. /subscriptions/<id>/resourceGroups/<rg>
    path: String,
    #[arg(long)]
    api_version: Option<String>,
    /// extra query string appended after api-version
    #[arg(long)]
    query: Option<String>,
    #[arg(long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,
    #[arg(long)]
    skip_validation: bool,
    #[arg(long)]
    timeout_seconds: Option<u64>,
}

#[derive(ClapArgs)]
struct WriteArgs {
    #[command(flatten)]
    target: Target,
    /// inline body; sent verbatim unless it parses as JSON
    #[arg(long, conflicts_with = "body_file")]
    body: Option<String>,
    #[arg(long)]
    body_file: Option<PathBuf>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_owned(), v.trim().to_owned()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("header '{raw}' must look like name=value"))
}

impl Target {
    fn options(&self, cancellation: CancellationToken) -> RequestOptions {
        let mut options = RequestOptions::new().with_cancellation(cancellation);
        if let Some(query) = &self.query {
            options = options.with_query(query.clone());
        }
        for (name, value) in &self.headers {
            options = options.with_header(name.clone(), value.clone());
        }
        if self.skip_validation {
            options = options.skip_resource_validation();
        }
        if let Some(seconds) = self.timeout_seconds {
            options = options.with_timeout(Duration::from_secs(seconds));
        }
        options
    }
}

impl WriteArgs {
    fn body(&self) -> Result<Value> {
        let raw = match (&self.body, &self.body_file) {
            (Some(body), _) => body.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("reading body file {}", path.display()))?,
            (None, None) => return Ok(Value::Null),
        };
        Ok(serde_json::from_str(&raw).unwrap_or(Value::String(raw)))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, start logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config)?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Build the client registry
    // -------------------------------

    let registry = ClientRegistry::from_config(&service_config)?;
    let default_api_version = service_config.settings.default_api_version.clone();

    // -------------------------------
    // 3. Ctrl-C cancels the in-flight call
    // -------------------------------

    let cancellation = CancellationToken::new();
    tokio::spawn({
        let cancellation = cancellation.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling");
                cancellation.cancel();
            }
        }
    });

    // -------------------------------
    // 4. Run the command
    // -------------------------------

    let outcome = run_command(&args.command, &registry, default_api_version, cancellation).await;

    // -------------------------------
    // 5. Metrics go out whether or not the call failed
    // -------------------------------

    report_then(outcome, args.print_metrics, &mut std::io::stderr()).await
}

async fn run_command(
    command: &Command,
    registry: &ClientRegistry,
    default_api_version: Option<String>,
    cancellation: CancellationToken,
) -> Result<()> {
    let target = match command {
        Command::Get(target) | Command::Delete(target) => target,
        Command::Put(write) | Command::Patch(write) | Command::Post(write) => &write.target,
    };
    let api_version = target
        .api_version
        .clone()
        .or(default_api_version)
        .ok_or_else(|| anyhow!("--api-version is required when settings.default_api_version is not set"))?;
    let client = registry.get_or_create(&target.path).await?;
    let options = target.options(cancellation);

    info!("{} {}", command_name(command), target.path);
    let result: Value = match command {
        Command::Get(t) => client.get(&t.path, &api_version, options).await?,
        Command::Delete(t) => {
            client.delete(&t.path, &api_version, options).await?;
            Value::Null
        }
        Command::Put(w) => client.put(&w.target.path, &api_version, &w.body()?, options).await?,
        Command::Patch(w) => client.patch(&w.target.path, &api_version, &w.body()?, options).await?,
        Command::Post(w) => client.post(&w.target.path, &api_version, &w.body()?, options).await?,
    };

    if !result.is_null() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

/// Write the metrics exposition when asked, then hand back the command outcome.
async fn report_then(outcome: Result<()>, print_metrics: bool, out: &mut impl Write) -> Result<()> {
    if print_metrics {
        writeln!(out, "{}", metrics::render().await?)?;
    }
    outcome
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Get(_) => "GET",
        Command::Delete(_) => "DELETE",
        Command::Put(_) => "PUT",
        Command::Patch(_) => "PATCH",
        Command::Post(_) => "POST",
    }
}
