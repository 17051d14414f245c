//! perfSONAR Lookup Service Agent Entry Point

use clap::{Args, Parser, Subcommand};
use perfsonar_ls_agent::hints::fetch_global_hints;
use perfsonar_ls_agent::{logging, LookupClient, LsQuery, Registrar};
use perfsonar_ls_common::config::AgentConfig;
use perfsonar_ls_common::error::{LsError, LsResult};
use perfsonar_ls_common::types::ServiceDescriptor;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// perfSONAR Lookup Service agent - register and refresh service entries
#[derive(Parser, Debug)]
#[command(name = "ps-ls-agent")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    PSLS_LOG                          Log filter (default: info)
    PSLS__LS_URL                      Lookup service URL
    PSLS__KEEPALIVE_INTERVAL_SECS     Keepalive interval for `run` (default: 1800)
    PSLS__CLIENT__REQUEST_TIMEOUT_SECS  HTTP timeout (default: 30)
"#)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "PSLS_CONFIG")]
    config: Option<PathBuf>,

    /// Lookup service URL (overrides the configuration)
    #[arg(long, global = true)]
    ls_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Register the configured service once and print the returned key
    Register,
    /// Refresh a registration
    Keepalive(KeyArgs),
    /// Remove a registration
    Deregister(KeyArgs),
    /// Send XQuery requests and print the raw response
    Query(QueryArgs),
    /// List global lookup services from the hints file
    Hints(HintsArgs),
    /// Register and keep the registration alive until interrupted
    Run,
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// Key returned by a previous registration
    #[arg(long)]
    key: String,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// XQuery expression (repeatable)
    #[arg(long = "xquery", required = true)]
    xqueries: Vec<String>,

    /// Metadata id for each query, in order (0 or missing = generated)
    #[arg(long = "id")]
    ids: Vec<u32>,
}

#[derive(Args, Debug)]
struct HintsArgs {
    /// Hints file URL (overrides the configuration)
    #[arg(long)]
    url: Option<String>,

    /// Randomise the order of the returned services
    #[arg(long)]
    shuffle: bool,
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();

    if let Err(e) = execute(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> LsResult<()> {
    let mut config = AgentConfig::load(cli.config.as_deref())?;
    if let Some(ls_url) = cli.ls_url {
        config.ls_url = ls_url;
    }
    let client = LookupClient::from_config(&config.client)?;

    match cli.command {
        Commands::Register => {
            let service = required_service(&config)?;
            let ls_key = client
                .register(&config.ls_url, &service, &config.metadata)
                .await?;
            println!("{}", ls_key);
        }
        Commands::Keepalive(args) => {
            client.keepalive(&config.ls_url, &args.key).await?;
            info!("Keepalive accepted for {}", args.key);
        }
        Commands::Deregister(args) => {
            client.deregister(&config.ls_url, &args.key).await?;
            info!("Deregistered {}", args.key);
        }
        Commands::Query(args) => {
            let queries: Vec<LsQuery> = args
                .xqueries
                .into_iter()
                .enumerate()
                .map(|(i, xquery)| {
                    LsQuery::with_id(args.ids.get(i).copied().unwrap_or(0), xquery)
                })
                .collect();
            let response = client.query(&config.ls_url, &queries).await?;
            match response.event_types() {
                Ok(event_types) => {
                    for (i, event_type) in event_types.iter().enumerate() {
                        match event_type {
                            Some(event_type) => {
                                info!("Query metadata #{} event type: {}", i, event_type)
                            }
                            None => tracing::warn!("Query metadata #{} has no event type", i),
                        }
                    }
                }
                Err(e) => tracing::warn!("Could not read query event types: {}", e),
            }
            let document = response.document();
            println!("{}", render_document(&document));
        }
        Commands::Hints(args) => {
            let url = args.url.or(config.hints_url).ok_or_else(|| {
                LsError::Config("no hints URL given (use --url or hints_url)".to_string())
            })?;
            for hint in fetch_global_hints(&client, &url, args.shuffle).await? {
                println!("{}", hint);
            }
        }
        Commands::Run => {
            let service = required_service(&config)?;
            let registrar = Registrar::new(client, config.ls_url.clone(), service, config.metadata);
            info!(
                "Keeping registration alive with {} every {}s",
                config.ls_url, config.keepalive_interval_secs
            );
            registrar
                .run(
                    Duration::from_secs(config.keepalive_interval_secs),
                    shutdown_signal(),
                )
                .await?;
        }
    }

    Ok(())
}

fn required_service(config: &AgentConfig) -> LsResult<ServiceDescriptor> {
    config
        .service
        .clone()
        .ok_or_else(|| LsError::Config("no service configured".to_string()))
}

fn render_document(document: &sxd_document::dom::Document<'_>) -> String {
    let mut out = Vec::new();
    match sxd_document::writer::format_document(document, &mut out) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(e) => format!("<!-- failed to render response: {} -->", e),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
