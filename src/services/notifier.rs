//! Notification sink.
//!
//! Delivery is best effort: every failure is logged and reported as `false`,
//! nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::models::{Secrets, TelegramConfig};

/// Text formatting the receiving side should apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Html,
    Plain,
}

impl ParseMode {
    fn as_telegram(self) -> Option<&'static str> {
        match self {
            ParseMode::Html => Some("HTML"),
            ParseMode::Plain => None,
        }
    }
}

/// A single fixed destination for messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text`; `true` when the destination accepted it.
    async fn send(&self, text: &str, mode: ParseMode) -> bool;
}

/// Sends messages to one chat through the Telegram Bot API.
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
    disable_web_preview: bool,
}

#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, secrets: &Secrets) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                secrets.bot_token
            ),
            chat_id: secrets.chat_id.clone(),
            disable_web_preview: config.disable_web_preview,
        })
    }

    fn payload(&self, text: &str, mode: ParseMode) -> serde_json::Value {
        let mut body = json!({
            "chat_id": self.chat_id,
            "text": text,
            "disable_web_page_preview": self.disable_web_preview,
        });
        if let Some(parse_mode) = mode.as_telegram() {
            body["parse_mode"] = json!(parse_mode);
        }
        body
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str, mode: ParseMode) -> bool {
        let response = match self
            .client
            .post(&self.endpoint)
            .json(&self.payload(text, mode))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                // reqwest errors carry the URL, which holds the token.
                log::error!("Telegram delivery failed: {}", e.without_url());
                return false;
            }
        };

        let status = response.status();
        match response.json::<TelegramReply>().await {
            Ok(reply) if status.is_success() && reply.ok => {
                let preview: String = text.chars().take(50).collect();
                log::info!("Sent to Telegram: {preview}...");
                true
            }
            Ok(reply) => {
                log::error!(
                    "Telegram rejected message ({}): {}",
                    status,
                    reply.description.unwrap_or_default()
                );
                false
            }
            Err(e) => {
                log::error!("Telegram reply unreadable ({}): {}", status, e.without_url());
                false
            }
        }
    }
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str, _mode: ParseMode) -> bool {
        log::info!("Notification:\n{text}");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> TelegramNotifier {
        let secrets = Secrets {
            bot_token: "123:abc".to_string(),
            chat_id: "42".to_string(),
        };
        TelegramNotifier::new(&TelegramConfig::default(), &secrets).unwrap()
    }

    #[test]
    fn test_endpoint_contains_token() {
        assert_eq!(
            notifier().endpoint,
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_html_payload() {
        let body = notifier().payload("<b>hi</b>", ParseMode::Html);
        assert_eq!(body["chat_id"], "42");
        assert_eq!(body["text"], "<b>hi</b>");
        assert_eq!(body["parse_mode"], "HTML");
        assert_eq!(body["disable_web_page_preview"], false);
    }

    #[test]
    fn test_plain_payload_has_no_parse_mode() {
        let body = notifier().payload("hi", ParseMode::Plain);
        assert!(body.get("parse_mode").is_none());
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        assert!(LogNotifier.send("hello", ParseMode::Plain).await);
    }
}
