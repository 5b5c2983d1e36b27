//! Hunter CLI
//!
//! Runs the control surface and polling loop, or a single check.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use hunter::{
    error::Result,
    models::{Config, Secrets},
    pipeline::Monitor,
    server::{self, ApiState},
    services::{HttpFetcher, LogNotifier, Notifier, OfferExtractor, TelegramNotifier},
};

/// Hunter - marketplace offer monitor
#[derive(Parser, Debug)]
#[command(
    name = "hunter",
    version,
    about = "Watches marketplace listings and reports new offers"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "hunter.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the control surface
    Serve {
        /// Start monitoring right away
        #[arg(long)]
        monitor: bool,
    },

    /// Run one monitoring cycle
    Check {
        /// Deliver notifications to Telegram instead of the log
        #[arg(long)]
        notify: bool,
    },

    /// Print offers currently on the source pages
    Preview,

    /// Validate configuration and secrets
    Validate,
}

/// Initialize logging from the verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_monitor(config: &Arc<Config>, notifier: Arc<dyn Notifier>) -> Result<Monitor> {
    let fetcher = HttpFetcher::new(&config.fetch, &config.extraction.origin)?;
    Monitor::new(Arc::clone(config), Arc::new(fetcher), notifier)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = Config::load(&cli.config);
    let level = match &loaded {
        Ok(config) => config.logging.level.clone(),
        Err(_) => "info".to_string(),
    };
    init_logging(cli.verbose, &level);

    let config = loaded.unwrap_or_else(|e| {
        log::warn!("Config load failed from {:?}: {}. Using defaults.", cli.config, e);
        Config::default()
    });

    log::info!("Hunter starting...");
    config.validate()?;
    let config = Arc::new(config);

    match cli.command {
        Command::Serve { monitor: start_now } => {
            let secrets = Secrets::from_env()?;
            let monitor = Arc::new(Monitor::from_config(Arc::clone(&config), &secrets)?);

            if start_now || config.monitor.auto_start {
                monitor.start().await;
            }

            let state = ApiState::new(Arc::clone(&monitor), secrets.chat_id.clone());
            server::run(state, &config.listen_address(), shutdown_signal()).await?;

            monitor.shutdown().await;
            log::info!("Session stopped");
        }

        Command::Check { notify } => {
            let notifier: Arc<dyn Notifier> = if notify {
                Arc::new(TelegramNotifier::new(&config.telegram, &Secrets::from_env()?)?)
            } else {
                Arc::new(LogNotifier)
            };
            let monitor = build_monitor(&config, notifier)?;
            let report = monitor.check_now().await?;

            log::info!(
                "Checked {} sources ({} failed): {} offers, {} new",
                report.sources,
                report.failed_sources,
                report.offers_found,
                report.new_offers.len()
            );
        }

        Command::Preview => {
            let monitor = build_monitor(&config, Arc::new(LogNotifier))?;
            let offers = monitor.preview().await;

            for offer in &offers {
                println!("{}", offer.summary_line(&config.monitor.currency));
            }
            log::info!("{} offers on {} sources", offers.len(), config.sources.len());
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            OfferExtractor::new(&config.extraction)?;
            log::info!("✓ Config OK ({} sources)", config.sources.len());

            if let Err(e) = Secrets::from_env() {
                log::error!("Secrets check failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Secrets present");

            log::info!("All validations passed!");
        }
    }

    log::info!("Done!");

    Ok(())
}
