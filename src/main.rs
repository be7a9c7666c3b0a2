use std::sync::Arc;

use anyhow::Result;
use chrono::Offset;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use devlog_relay::api::{self, AppState};
use devlog_relay::config::Config;
use devlog_relay::dispatch::NotificationDispatcher;
use devlog_relay::registry::CredentialRegistry;
use devlog_relay::scheduler::Scheduler;
use devlog_relay::sink::SlackSink;
use devlog_relay::source::FlavortownFactory;
use devlog_relay::store::SeenIdStore;
use devlog_relay::sync::SyncEngine;

#[derive(Parser)]
#[command(name = "devlog-relay")]
#[command(about = "Announces new Flavortown devlogs in Slack")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server and the sweep loop
    Serve {
        /// Port for the HTTP server (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run a single sweep and exit
    Sweep,
    /// Print how many credentials are registered
    Stats,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "devlog_relay=info,tower_http=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn build_scheduler(
    config: &Config,
    store: SeenIdStore,
    registry: CredentialRegistry,
) -> Result<Scheduler> {
    let sink = SlackSink::with_timeout(
        config.slack_api_url.clone(),
        config.require_slack_token()?,
        config.http_timeout,
    )?;
    let offset = chrono::Local::now().offset().fix();
    let dispatcher = NotificationDispatcher::new(Arc::new(sink), config.pacing, offset);

    Ok(Scheduler::new(
        registry,
        SyncEngine::new(store),
        dispatcher,
        Arc::new(
            FlavortownFactory::new(config.source_api_url.clone()).with_timeout(config.http_timeout),
        ),
        config.sweep_interval,
    ))
}

async fn serve(config: Config, port: u16) -> Result<()> {
    let store = SeenIdStore::open(&config.cache_dir)?;
    let registry = CredentialRegistry::open(&config.cache_dir);
    registry.load()?;

    let scheduler = build_scheduler(&config, store.clone(), registry.clone())?;
    tokio::spawn(scheduler.run());

    let app = api::create_router(AppState { registry, store });
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("devlog-relay listening on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env()?;
    tracing::info!(cache_dir = %config.cache_dir.display(), "Loaded configuration");

    match cli.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(config.port);
            serve(config, port).await?;
        }
        Some(Commands::Sweep) => {
            let store = SeenIdStore::open(&config.cache_dir)?;
            let registry = CredentialRegistry::open(&config.cache_dir);
            let mut scheduler = build_scheduler(&config, store, registry)?;
            scheduler.sweep().await;
        }
        Some(Commands::Stats) => {
            let registry = CredentialRegistry::open(&config.cache_dir);
            println!("There are {} API keys in use.", registry.count()?);
        }
        None => {
            let port = config.port;
            serve(config, port).await?;
        }
    }

    Ok(())
}
