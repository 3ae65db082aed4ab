//! zkattend - ZKTeco attendance sync
//!
//! Operator CLI: device commands, one-off downloads and the periodic
//! download loop.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use zkattend_sync::{Config, MemoryLedger, SyncService, ZkGatewayFactory};

mod commands;

/// zkattend - pull punches from ZKTeco terminals into the attendance ledger
#[derive(Parser, Debug)]
#[command(name = "zkattend")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "zkattend.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    // === Device commands ===
    /// Connect and show serial, firmware and store counts
    Test {
        /// Device name
        device: String,
    },

    /// Push this host's clock to the device
    SetClock {
        /// Device name
        device: String,
    },

    /// Delete every punch stored on the device
    Clear {
        /// Device name
        device: String,

        /// Skip the confirmation guard
        #[arg(long)]
        yes: bool,
    },

    /// Restart the device
    Restart {
        /// Device name
        device: String,
    },

    // === Sync ===
    /// Download punches into the ledger
    Download {
        /// Only this device (default: all)
        #[arg(short, long)]
        device: Option<String>,
    },

    /// Download from every device periodically until Ctrl-C
    Schedule,

    // === Ledger ===
    /// Show an employee's attendance intervals
    Intervals {
        /// Terminal user id of the employee
        #[arg(long)]
        device_user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let zone = config.zone()?;
    let ledger = MemoryLedger::open(&config.ledger_path)
        .with_context(|| format!("failed to open ledger {}", config.ledger_path.display()))?;
    let service = SyncService::new(
        config,
        Arc::new(ledger),
        Box::new(ZkGatewayFactory::new(zone)),
    )?;

    let status = match cli.command {
        Commands::Test { device } => commands::test(&service, &device).await,
        Commands::SetClock { device } => commands::set_clock(&service, &device).await,
        Commands::Clear { device, yes } => commands::clear(&service, &device, yes).await,
        Commands::Restart { device } => commands::restart(&service, &device).await,
        Commands::Download { device } => commands::download(&service, device.as_deref()).await,
        Commands::Schedule => commands::schedule(&service).await?,
        Commands::Intervals { device_user } => {
            commands::intervals(&service, &device_user).await?
        }
    };

    if status != commands::Status::Ok {
        std::process::exit(status.code());
    }
    Ok(())
}
