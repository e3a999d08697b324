use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use airsentry::api::routes;
use airsentry::capture::clock::MonotonicClock;
use airsentry::capture::manager::ModeCoordinator;
use airsentry::models::config::AppConfig;
use airsentry::models::state::RadioMode;
use airsentry::radio::{SimulatedRadio, TrafficProfile};
use airsentry::utils::logging;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Single-radio wireless monitor with deauthentication attack detection")]
struct Args {
    /// Port for the REST API server
    #[clap(short, long)]
    port: Option<u16>,

    /// Channel to tune at startup (1-14)
    #[clap(short, long)]
    channel: Option<u8>,

    /// Mode to start at boot (scanning, sniffing, spamming, detecting)
    #[clap(short, long)]
    mode: Option<String>,

    /// JSON configuration file
    #[clap(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[clap(long, default_value = "info")]
    log_level: String,

    /// Number of RSSI samples kept for the history view
    #[clap(long)]
    history_size: Option<usize>,

    /// Capacity of the general capture queue
    #[clap(long)]
    capture_queue: Option<usize>,

    /// Capacity of the deauth detection queue
    #[clap(long)]
    deauth_queue: Option<usize>,

    /// Disable the periodic deauth bursts of the simulated radio
    #[clap(long)]
    quiet: bool,
}

impl Args {
    /// File values first, then command-line overrides
    fn build_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => AppConfig::default(),
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(channel) = self.channel {
            config.channel = channel;
        }
        if let Some(size) = self.history_size {
            config.history_size = size;
        }
        if let Some(capacity) = self.capture_queue {
            config.capture_queue_capacity = capacity;
        }
        if let Some(capacity) = self.deauth_queue {
            config.deauth_queue_capacity = capacity;
        }

        config.validate()?;
        Ok(config)
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logger(logging::get_log_level(&args.log_level));

    info!("Starting AirSentry v{}", env!("CARGO_PKG_VERSION"));

    let config = args.build_config()?;
    let boot_mode = args
        .mode
        .as_deref()
        .map(str::parse::<RadioMode>)
        .transpose()?;

    let clock = MonotonicClock::new();
    let profile = if args.quiet {
        TrafficProfile::quiet()
    } else {
        TrafficProfile::default()
    };
    let radio = Arc::new(SimulatedRadio::new(clock, profile));

    let coordinator = Arc::new(RwLock::new(ModeCoordinator::with_clock(
        config.clone(),
        radio,
        clock,
    )));

    if let Some(mode) = boot_mode {
        if let Err(e) = coordinator.write().await.start_mode(mode).await {
            warn!("Boot mode {} failed: {}", mode, e);
        }
    }

    let app_state = web::Data::new(coordinator.clone());

    info!("Starting AirSentry API server on port {}", config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind(format!("127.0.0.1:{}", config.port))?
    .run()
    .await?;

    let state = coordinator.write().await.stop_all().await;
    info!("Radio released, final state {}", state);

    Ok(())
}
