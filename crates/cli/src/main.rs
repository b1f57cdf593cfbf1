//! usb-arrival listener
//!
//! Registers for USB device-interface arrival notifications and logs each
//! decoded event until interrupted.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::WatchConfig;

#[derive(Parser, Debug)]
#[command(name = "usb-arrival")]
#[command(
    author,
    version,
    about = "Watch USB device arrivals and print them as structured events"
)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Save default configuration to the default location and exit
    #[arg(long)]
    save_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Run-loop poll interval in milliseconds
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,

    /// Window class name for the hidden message endpoint
    #[arg(long, value_name = "NAME")]
    class_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.save_config {
        let config = WatchConfig::default();
        let path = WatchConfig::default_path();
        config.save(&path).context("failed to save configuration")?;
        println!("configuration saved to: {}", path.display());
        return Ok(());
    }

    let mut config = WatchConfig::load(args.config).context("failed to load configuration")?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if let Some(ms) = args.poll_interval_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(name) = args.class_name {
        config.window_class = name;
    }

    watcher::setup_logging(&config.log_level)?;
    tracing::debug!(
        class = %config.window_class,
        poll_ms = config.poll_interval().as_millis() as u64,
        capacity = config.channel_capacity,
        "loaded configuration"
    );
    run(config).await
}

#[cfg(windows)]
async fn run(config: WatchConfig) -> Result<()> {
    use tracing::info;
    use watcher::RegisterOptions;

    let options = RegisterOptions {
        class_name: config.window_class.clone(),
        channel_capacity: config.channel_capacity,
        poll_interval: config.poll_interval(),
        ..Default::default()
    };
    let handle = watcher::spawn_notifier(watcher::win32::Win32System, options)
        .context("registration failed")?;
    info!(
        class = %config.window_class,
        "watching for USB device arrivals, Ctrl-C to stop"
    );

    let events = handle.events();
    let consumer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!(
                device_type = event.device_type,
                class_guid = %event.class_guid,
                name = %event.device_name,
                "device arrival"
            );
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutting down");

    tokio::task::spawn_blocking(move || handle.shutdown())
        .await
        .context("pump thread join failed")?
        .context("pump shutdown failed")?;
    consumer.await.context("consumer task failed")?;
    Ok(())
}

#[cfg(not(windows))]
async fn run(_config: WatchConfig) -> Result<()> {
    anyhow::bail!(
        "live device notifications require Windows; \
         the wire and watcher library crates (and their tests) are portable"
    )
}
