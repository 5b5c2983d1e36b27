// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};

use crate::error::{AppError, Result};
use crate::models::FetchConfig;

/// Create a configured asynchronous HTTP client that looks like a browser.
pub fn create_async_client(config: &FetchConfig, referer: &str) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, header_value(&config.accept)?);
    headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);
    let referer = if referer.ends_with('/') {
        referer.to_string()
    } else {
        format!("{referer}/")
    };
    headers.insert(REFERER, header_value(&referer)?);

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page body, treating anything but 200 as an error.
pub async fn fetch_page_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(AppError::fetch_status(url, status.as_u16()));
    }
    Ok(response.text().await?)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::config(format!("invalid header value '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_client_builds() {
        let config = FetchConfig::default();
        assert!(create_async_client(&config, "https://example.test").is_ok());
    }

    #[test]
    fn test_bad_header_is_config_error() {
        let config = FetchConfig {
            accept_language: "ru\nRU".to_string(),
            ..FetchConfig::default()
        };
        assert!(matches!(
            create_async_client(&config, "https://example.test"),
            Err(AppError::Config(_))
        ));
    }
}
