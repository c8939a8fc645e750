use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nobat::booking::BookingClient;
use nobat::config::Config;
use nobat::extractor::{ExtractionSource, ProfileExtractor};
use nobat::models::{Center, Doctor, Service, User};
use nobat::notify::{BotApiChannel, BotApiConfig, NotificationFanout};
use nobat::providers::{LogAudit, MemoryCatalog, MemorySubscriberStore};
use nobat::scheduler::{
    shutdown_channel, DistributedConfig, DistributedMonitor, Monitor,
};

#[derive(Parser)]
#[command(
    name = "nobat",
    version,
    about = "Appointment-slot watcher for medical booking pages",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the doctors in a watch-list file and alert subscribers
    Watch {
        /// Watch-list JSON file (doctors + users)
        #[arg(short, long)]
        watchlist: PathBuf,

        /// Run a single cycle and exit
        #[arg(long, default_value = "false")]
        once: bool,

        /// Use the distributed worker-pool execution mode
        #[arg(long, default_value = "false")]
        distributed: bool,

        /// Worker count override for distributed mode
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Extract the identifier bundle from a shared profile URL
    Extract {
        /// Profile URL, path fragment, or bare slug
        url: String,
    },

    /// Diagnostic hold/release round-trip against one center/service
    Selftest {
        #[arg(long)]
        center_id: String,

        #[arg(long)]
        user_center_id: String,

        #[arg(long)]
        service_id: String,
    },
}

/// Watch-list file shape: the catalog and subscriber data the external
/// persistence layer would normally own.
#[derive(Debug, Deserialize)]
struct WatchList {
    doctors: Vec<Doctor>,
    #[serde(default)]
    users: Vec<WatchUser>,
}

#[derive(Debug, Deserialize)]
struct WatchUser {
    id: i64,
    display_name: String,
    chat_id: i64,
    #[serde(default)]
    doctor_ids: Vec<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;

    tracing::info!("nobat watcher starting");

    match cli.command {
        Commands::Watch {
            watchlist,
            once,
            distributed,
            workers,
        } => {
            tracing::info!(
                watchlist = %watchlist.display(),
                once = %once,
                distributed = %distributed,
                "Starting watch command"
            );
            watch(config, watchlist, once, distributed, workers).await?;
        }

        Commands::Extract { url } => {
            tracing::info!(url = %url, "Starting extract command");
            extract(config, url).await?;
        }

        Commands::Selftest {
            center_id,
            user_center_id,
            service_id,
        } => {
            tracing::info!(center_id = %center_id, "Starting selftest command");
            selftest(config, center_id, user_center_id, service_id).await?;
        }
    }

    tracing::info!("nobat completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("nobat=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("nobat=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

async fn watch(
    config: Config,
    watchlist: PathBuf,
    once: bool,
    distributed: bool,
    workers: Option<usize>,
) -> Result<()> {
    let content = tokio::fs::read_to_string(&watchlist)
        .await
        .with_context(|| format!("Failed to read watch list: {}", watchlist.display()))?;
    let list: WatchList =
        serde_json::from_str(&content).context("Failed to parse watch list JSON")?;

    let catalog = Arc::new(MemoryCatalog::new(list.doctors));
    let subscribers = Arc::new(MemorySubscriberStore::new());
    for user in list.users {
        subscribers
            .add_user(
                User {
                    id: user.id,
                    display_name: user.display_name,
                    active: true,
                },
                user.chat_id,
            )
            .await;
        for doctor_id in user.doctor_ids {
            subscribers.subscribe(user.id, doctor_id).await;
        }
    }

    let channel = BotApiChannel::new(BotApiConfig::from(&config.messaging))
        .map_err(anyhow::Error::msg)
        .context("Failed to create messaging channel")?;

    let fanout = Arc::new(NotificationFanout::new(
        subscribers,
        Arc::new(channel),
        Arc::new(LogAudit),
        config.provider.profile_base.clone(),
        config.send_pause(),
    ));

    let client = Arc::new(BookingClient::new(
        &config.booking,
        &config.provider.profile_base,
    )?);

    let monitor = Arc::new(Monitor::new(
        client,
        fanout,
        catalog.clone(),
        &config.watcher,
    ));

    let (stop_tx, stop_rx) = shutdown_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping after current unit");
            let _ = stop_tx.send(true);
        }
    });

    if distributed {
        let dist_config = DistributedConfig {
            workers: workers.unwrap_or(config.watcher.workers),
            ..Default::default()
        };
        let dist = DistributedMonitor::new(monitor, catalog, dist_config)?;

        if once {
            let snapshot = dist.snapshot().await?;
            let report = dist.run_cycle(&snapshot, Some(stop_rx)).await?;
            println!("{}", report.summary());
        } else {
            dist.run(stop_rx, config.poll_interval()).await;
        }
    } else if once {
        let snapshot = monitor.snapshot().await?;
        let report = monitor.run_cycle_with_stop(&snapshot, Some(&stop_rx)).await;
        println!("{}", report.summary());
    } else {
        monitor.run(stop_rx).await;
    }

    Ok(())
}

async fn extract(config: Config, url: String) -> Result<()> {
    let extractor = ProfileExtractor::new(&config.provider)?;

    match extractor.extract(&url).await {
        Ok(bundle) => {
            let source = match bundle.source {
                ExtractionSource::Structured => "structured",
                ExtractionSource::Heuristic => "heuristic",
                ExtractionSource::Placeholder => "placeholder",
            };
            let output = serde_json::json!({
                "functional": bundle.functional,
                "source": source,
                "doctor": bundle.doctor,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            if !bundle.functional {
                tracing::warn!(
                    "bundle is non-functional (placeholder identifiers); it will be excluded from polling"
                );
            }
            Ok(())
        }
        Err(e) => {
            // Structured reason makes the failure actionable for the caller
            anyhow::bail!("extraction failed ({:?}): {e}", e.reason());
        }
    }
}

async fn selftest(
    config: Config,
    center_id: String,
    user_center_id: String,
    service_id: String,
) -> Result<()> {
    let client = BookingClient::new(&config.booking, &config.provider.profile_base)?;

    let center = Center {
        center_id,
        user_center_id,
        name: "selftest".to_string(),
        address: String::new(),
        phone: String::new(),
        services: Vec::new(),
    };
    let service = Service {
        service_id,
        name: None,
    };

    let terminal = client.new_terminal();
    let days = client.list_open_days(&center, &service, &terminal).await?;
    let days = nobat::booking::filter_days(days, chrono::Utc::now().timestamp(), config.watcher.days_ahead);
    println!("open days in window: {}", days.len());

    let Some(&day) = days.first() else {
        println!("no open days; hold/release skipped");
        return Ok(());
    };

    let slots = client
        .list_slots_for_day(&center, &service, &terminal, day)
        .await?;
    println!("slots on first day: {}", slots.len());

    let Some(slot) = slots.first() else {
        println!("no slots on first day; hold/release skipped");
        return Ok(());
    };

    let token = client.hold_slot(&center, &service, slot).await?;
    println!("hold acquired: {}", token.as_str());

    client.release_hold(&center, &token).await?;
    println!("hold released; protocol round-trip ok");

    Ok(())
}
