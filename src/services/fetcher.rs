//! Source page fetching.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::FetchConfig;
use crate::utils::http;

/// Anything that can return the HTML of a listing page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`; non-200 responses are errors.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetcher backed by a browser-like reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig, referer: &str) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config, referer)?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("GET {url}");
        http::fetch_page_text(&self.client, url).await
    }
}
