//! Cloud SQL Backup Resource - Main entry point
//!
//! Reads the request JSON from stdin, runs one verb, and prints the response
//! JSON to stdout. Invoked either as `cloudsql-backup-resource <verb>` or
//! through `check` / `in` / `out` links to the binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cloudsql_backup_resource::auth::{ServiceAccountAuthenticator, ServiceAccountKey};
use cloudsql_backup_resource::client::SqlAdminClient;
use cloudsql_backup_resource::poller::BackupPoller;
use cloudsql_backup_resource::protocol::{CheckRequest, GetRequest, PutRequest, Source};
use cloudsql_backup_resource::{resource, signals, utils, Config};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List backup versions
    Check,
    /// Wait for a backup to succeed and write it to DIR/output.json
    In {
        /// Destination directory
        dir: PathBuf,
    },
    /// Start a new backup
    Out {
        /// Build sources directory (unused)
        dir: PathBuf,
    },
}

/// Insert the verb when the binary is invoked through a `check`/`in`/`out` link.
fn with_linked_verb(mut args: Vec<OsString>) -> Vec<OsString> {
    let verb = args
        .first()
        .and_then(|arg0| Path::new(arg0).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| matches!(*name, "check" | "in" | "out"))
        .map(OsString::from);
    if let Some(verb) = verb {
        args.insert(1, verb);
    }
    args
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_from(with_linked_verb(std::env::args_os().collect()));

    let config = Config::load(args.config.as_deref()).context("failed to load configuration")?;

    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    tracing::debug!("Starting cloudsql-backup-resource v{}", env!("CARGO_PKG_VERSION"));

    run(args.command, &config).await
}

async fn run(command: Command, config: &Config) -> Result<()> {
    let input = read_stdin()?;
    let offset = config.report_offset()?;

    match command {
        Command::Check => {
            let request: CheckRequest = parse_request(&input)?;
            let client = connect(config, &request.source)?;
            let versions = resource::check(&client, &request, config.check.mode).await?;
            emit(&versions)
        }
        Command::In { dir } => {
            let request: GetRequest = parse_request(&input)?;
            let client = connect(config, &request.source)?;

            let cancel = CancellationToken::new();
            signals::cancel_on_signal(cancel.clone());
            let poller = BackupPoller::new(&client)
                .interval(config.poll_interval())
                .max_wait(config.max_wait())
                .max_attempts(config.poll.max_attempts)
                .cancel_token(cancel);

            let response = resource::get(&poller, &request, &dir, &offset).await?;
            emit(&response)
        }
        Command::Out { dir } => {
            tracing::debug!("Ignoring sources directory {}", dir.display());
            let request: PutRequest = parse_request(&input)?;
            let client = connect(config, &request.source)?;
            let response = resource::put(&client, &request, &offset).await?;
            emit(&response)
        }
    }
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read request from stdin")?;
    Ok(input)
}

fn parse_request<T: DeserializeOwned>(input: &str) -> Result<T> {
    serde_json::from_str(input).context("invalid request JSON on stdin")
}

/// Build the API client for `source`; the key never leaves memory.
fn connect(config: &Config, source: &Source) -> Result<SqlAdminClient> {
    let http = SqlAdminClient::http_client(config.request_timeout())?;
    let key = ServiceAccountKey::from_json(&source.private_key)?;
    let auth = ServiceAccountAuthenticator::new(key, config.auth.scope.clone(), http.clone())?;
    tracing::debug!(
        "Using service account {} for {}/{}",
        auth.client_email(),
        source.project,
        source.instance
    );
    Ok(SqlAdminClient::new(http, config.api.base_url.clone(), Arc::new(auth)))
}

fn emit<T: Serialize>(payload: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}
