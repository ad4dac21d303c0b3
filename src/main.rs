//! # Recurbot — Recurring Telegram Posts
//!
//! Usage:
//!   recurbot serve                  # HTTP UI + in-process scheduler
//!   recurbot tick                   # one scheduler pass (for external cron)
//!   recurbot list                   # print live templates
//!   recurbot send <id>              # send one template now
//!   recurbot init                   # write a default config file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recurbot_channels::TelegramGateway;
use recurbot_core::{MessagingGateway, RecurbotConfig};
use recurbot_scheduler::{DispatchExecutor, Scheduler, TemplateRegistry, TickHandler};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "recurbot",
    version,
    about = "⏰ Recurbot — recurring Telegram posts from message templates"
)]
struct Cli {
    /// Config file (default: ~/.recurbot/config.toml, or $RECURBOT_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the management UI and run the scheduler loop
    Serve {
        /// Override gateway.port
        #[arg(short, long)]
        port: Option<u16>,
        /// Override gateway.host
        #[arg(long)]
        host: Option<String>,
    },
    /// Run a single scheduler pass and exit
    Tick,
    /// Print all live templates as JSON
    List,
    /// Send one template immediately
    Send {
        /// Template id
        id: String,
    },
    /// Write a default config file if none exists
    Init,
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .clone()
        .or_else(|| std::env::var("RECURBOT_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(RecurbotConfig::default_path)
}

fn load_config(path: &std::path::Path) -> Result<RecurbotConfig> {
    let mut config = if path.exists() {
        RecurbotConfig::load_from(path)?
    } else {
        tracing::debug!("No config at {}, using defaults", path.display());
        RecurbotConfig::default()
    };
    config.apply_env();
    Ok(config)
}

/// Wire store → registry → gateway → executor from configuration.
fn build_executor(config: &RecurbotConfig) -> Result<DispatchExecutor> {
    config.validate()?;
    let store = recurbot_scheduler::open_store(&config.store)?;
    let gateway = Arc::new(TelegramGateway::new(config.telegram.clone()));
    tracing::info!("📦 Store: {} | 📨 Gateway: {}", store.name(), gateway.name());
    let registry = TemplateRegistry::new(store);
    Ok(DispatchExecutor::new(gateway, registry))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "recurbot=debug,recurbot_scheduler=debug,recurbot_gateway=debug,tower_http=debug"
    } else {
        "recurbot=info,recurbot_scheduler=info,recurbot_gateway=info,recurbot_channels=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let path = config_path(&cli);

    match cli.command {
        Command::Init => {
            if path.exists() {
                println!("⚠️  Config already exists: {}", path.display());
            } else {
                RecurbotConfig::default().save_to(&path)?;
                println!("✅ Wrote default config: {}", path.display());
                println!("   Set telegram.bot_token and telegram.chat_id before serving.");
            }
        }
        Command::Serve { port, host } => {
            let mut config = load_config(&path)?;
            if let Some(port) = port {
                config.gateway.port = port;
            }
            if let Some(host) = host {
                config.gateway.host = host;
            }
            let executor = build_executor(&config)?;

            if config.scheduler.enabled {
                let scheduler: Arc<dyn TickHandler> = Arc::new(Scheduler::new(executor.clone()));
                let tick_secs = config.scheduler.tick_secs;
                tokio::spawn(async move {
                    recurbot_scheduler::spawn_scheduler(scheduler, tick_secs).await;
                });
            } else {
                tracing::info!("Scheduler disabled by config, serving UI only");
            }

            println!("⏰ Recurbot v{}", env!("CARGO_PKG_VERSION"));
            println!("   🌐 UI:     http://{}:{}", config.gateway.host, config.gateway.port);
            println!("   ⚙️  Config: {}", path.display());
            println!();

            recurbot_gateway::start(&config.gateway, recurbot_gateway::AppState::new(executor))
                .await?;
        }
        Command::Tick => {
            let config = load_config(&path)?;
            let scheduler = Scheduler::new(build_executor(&config)?);
            let report = scheduler
                .on_tick(chrono::Utc::now())
                .await
                .context("Error in scheduled tick")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::List => {
            let config = load_config(&path)?;
            let store = recurbot_scheduler::open_store(&config.store)?;
            let templates = TemplateRegistry::new(store).list().await?;
            println!("{}", serde_json::to_string_pretty(&templates)?);
        }
        Command::Send { id } => {
            let config = load_config(&path)?;
            let executor = build_executor(&config)?;
            let result = executor.send_now(&id, chrono::Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
