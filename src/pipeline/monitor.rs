// src/pipeline/monitor.rs

//! Polling loop and monitoring session.
//!
//! `Monitor` owns every piece of mutable monitoring state: the seen-offer
//! store and the session (cancellation token plus task handle). The control
//! surface and the background task share it through an `Arc`.
//!
//! One cycle fetches every configured source, extracts offers, keeps the ones
//! the store has not seen and sends one notification per new offer, in page
//! order. A failed or panicking cycle is logged and followed by a longer
//! pause; it never ends the loop.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use futures::FutureExt;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Config, Offer, Secrets, SourceTarget};
use crate::services::{
    HttpFetcher, Notifier, OfferExtractor, PageFetcher, ParseMode, SeenOffers, TelegramNotifier,
};

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

/// Summary of one cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub sources: usize,
    pub failed_sources: usize,
    pub offers_found: usize,
    pub new_offers: Vec<Offer>,
    pub failed_deliveries: usize,
    pub tracked: usize,
}

/// Snapshot for status views.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub active: bool,
    pub item_count: usize,
    pub interval_secs: u64,
    pub recent: Vec<Offer>,
}

#[derive(Default)]
struct Session {
    token: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

impl Session {
    fn is_active(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_cancelled())
    }
}

/// The monitoring service.
pub struct Monitor {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    notifier: Arc<dyn Notifier>,
    extractor: OfferExtractor,
    seen: Mutex<SeenOffers>,
    session: Mutex<Session>,
}

impl Monitor {
    /// Create a monitor from its collaborators.
    pub fn new(
        config: Arc<Config>,
        fetcher: Arc<dyn PageFetcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let extractor = OfferExtractor::new(&config.extraction)?;
        Ok(Self {
            config,
            fetcher,
            notifier,
            extractor,
            seen: Mutex::new(SeenOffers::new()),
            session: Mutex::new(Session::default()),
        })
    }

    /// Create a monitor that fetches over HTTP and reports to Telegram.
    pub fn from_config(config: Arc<Config>, secrets: &Secrets) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetch, &config.extraction.origin)?;
        let notifier = TelegramNotifier::new(&config.telegram, secrets)?;
        Self::new(config, Arc::new(fetcher), Arc::new(notifier))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Begin a monitoring session unless one is already active.
    pub async fn start(self: &Arc<Self>) -> StartOutcome {
        let mut session = self.session.lock().await;
        if session.is_active() {
            log::warn!("Monitoring is already running");
            return StartOutcome::AlreadyRunning;
        }

        let token = CancellationToken::new();
        let previous = session.handle.take();
        let monitor = Arc::clone(self);
        let task_token = token.clone();
        session.handle = Some(tokio::spawn(async move {
            // A stopped session may still be finishing its last cycle.
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            monitor.run(task_token).await;
        }));
        session.token = Some(token);
        StartOutcome::Started
    }

    /// End the active session. The cycle in flight, if any, still completes.
    pub async fn stop(&self) -> StopOutcome {
        let session = self.session.lock().await;
        match &session.token {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                log::info!("Monitoring stop requested");
                StopOutcome::Stopped
            }
            _ => StopOutcome::NotRunning,
        }
    }

    /// Stop and wait for the background task to finish.
    pub async fn shutdown(&self) {
        self.stop().await;
        let handle = self.session.lock().await.handle.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    pub async fn is_active(&self) -> bool {
        self.session.lock().await.is_active()
    }

    /// Number of distinct offers reported so far.
    pub async fn tracked_count(&self) -> usize {
        self.seen.lock().await.len()
    }

    pub async fn status(&self, recent: usize) -> MonitorStatus {
        let active = self.is_active().await;
        let seen = self.seen.lock().await;
        MonitorStatus {
            active,
            item_count: seen.len(),
            interval_secs: self.config.monitor.interval_secs,
            recent: seen.recent(recent),
        }
    }

    /// Run one cycle right now, whatever the session state.
    pub async fn check_now(&self) -> Result<CycleReport> {
        log::info!("Manual check requested");
        self.run_cycle().await
    }

    /// Extract offers from every source without recording or notifying.
    pub async fn preview(&self) -> Vec<Offer> {
        let mut offers = Vec::new();
        for (source, result) in self.collect_all().await {
            match result {
                Ok(found) => offers.extend(found),
                Err(e) => log::error!("Preview of {} failed: {}", source.url, e),
            }
        }
        offers
    }

    async fn run(self: Arc<Self>, token: CancellationToken) {
        let interval = Duration::from_secs(self.config.monitor.interval_secs);
        let backoff = Duration::from_secs(self.config.monitor.error_backoff_secs);
        log::info!("Monitoring started, checking every {}s", interval.as_secs());

        loop {
            // Covers a stop that landed before this task first ran.
            if token.is_cancelled() {
                break;
            }

            let pause = match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
                Ok(Ok(report)) => {
                    log::info!(
                        "Cycle done: {} offers, {} new, {} tracked",
                        report.offers_found,
                        report.new_offers.len(),
                        report.tracked
                    );
                    interval
                }
                Ok(Err(e)) => {
                    log::error!("Monitoring cycle failed: {e}");
                    backoff
                }
                Err(panic) => {
                    log::error!("Monitoring cycle panicked: {}", panic_message(&*panic));
                    backoff
                }
            };

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        log::info!("Monitoring stopped");
    }

    /// Fetch, extract, deduplicate and notify once over all sources.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let pages = self.collect_all().await;
        let mut report = CycleReport {
            sources: pages.len(),
            ..CycleReport::default()
        };
        let mut escalated = Vec::new();

        for (source, result) in pages {
            let offers = match result {
                Ok(offers) => offers,
                Err(e) => {
                    report.failed_sources += 1;
                    log::error!("Fetching {} failed: {}", source.url, e);
                    if !e.is_transient() {
                        escalated.push(format!("{}: {}", source.url, e));
                    }
                    continue;
                }
            };
            report.offers_found += offers.len();

            let fresh: Vec<Offer> = {
                let mut seen = self.seen.lock().await;
                offers.into_iter().filter(|o| seen.is_new(o)).collect()
            };

            for offer in fresh {
                let time = Local::now().format("%H:%M:%S").to_string();
                let text = offer.notification(&self.config.monitor.currency, &time);
                if !self.notifier.send(&text, ParseMode::Html).await {
                    report.failed_deliveries += 1;
                }
                report.new_offers.push(offer);
            }
        }

        report.tracked = self.tracked_count().await;
        if escalated.is_empty() {
            Ok(report)
        } else {
            Err(AppError::cycle(escalated.join("; ")))
        }
    }

    async fn collect_all(&self) -> Vec<(SourceTarget, Result<Vec<Offer>>)> {
        let concurrency = self.config.fetch.max_concurrent.max(1);
        stream::iter(self.config.sources.clone())
            .map(|source| async move {
                let result = self.collect_source(&source).await;
                (source, result)
            })
            .buffered(concurrency)
            .collect()
            .await
    }

    async fn collect_source(&self, source: &SourceTarget) -> Result<Vec<Offer>> {
        log::info!("Checking {} ({})", source.category, source.url);
        let html = self.fetcher.fetch(&source.url).await?;
        Ok(self.extractor.extract(&html, &source.category, &source.url))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
