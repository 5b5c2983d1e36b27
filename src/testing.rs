//! Shared test doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Config, SourceTarget};
use crate::services::{Notifier, PageFetcher, ParseMode};

/// Three cards: online + keyword, offline + keyword, online without keyword.
pub const LISTING_PAGE: &str = r#"<html><body>
    <a class="tc-item" href="/lots/1">
        <div class="tc-desc-text">Black Russia 1kk</div>
        <div class="media-user-status">Онлайн</div>
        <div class="tc-price">500 руб.</div>
    </a>
    <a class="tc-item" href="/lots/2">
        <div class="tc-desc-text">Black Russia 2kk</div>
        <div class="media-user-status">Был давно</div>
        <div class="tc-price">600 руб.</div>
    </a>
    <a class="tc-item" href="/lots/3">
        <div class="tc-desc-text">Arizona RP 3kk</div>
        <div class="media-user-status">Онлайн</div>
        <div class="tc-price">700 руб.</div>
    </a>
</body></html>"#;

pub fn test_config() -> Arc<Config> {
    let mut config = Config::default();
    config.sources = vec![SourceTarget {
        url: "https://example.test/chips/186/".to_string(),
        category: "BR".to_string(),
    }];
    config.extraction.origin = "https://example.test".to_string();
    Arc::new(config)
}

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Page,
    /// Serve the page after a delay
    Slow(Duration),
    NotFound,
    Broken,
    Panic,
}

pub struct FakeFetcher {
    html: String,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new(html: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            html: html.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Page => Ok(self.html.clone()),
            Behavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.html.clone())
            }
            Behavior::NotFound => Err(AppError::fetch_status(url, 404)),
            Behavior::Broken => Err(AppError::config("fetcher misconfigured")),
            Behavior::Panic => panic!("fetcher exploded"),
        }
    }
}

pub struct RecordingNotifier {
    accept: bool,
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new(accept: bool) -> Arc<Self> {
        Arc::new(Self {
            accept,
            messages: Mutex::new(Vec::new()),
        })
    }

    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str, _mode: ParseMode) -> bool {
        self.messages.lock().unwrap().push(text.to_string());
        self.accept
    }
}
