//! Telegram webhook: chat commands that drive the monitor.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Local;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiError, ApiState};
use crate::models::Config;
use crate::pipeline::{Monitor, StartOutcome};
use crate::services::ParseMode;

/// The slice of a Telegram update this service reads.
#[derive(Debug, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub text: Option<String>,
    pub chat: Chat,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: Value,
}

impl Chat {
    /// Telegram sends numeric ids; the configured id is a string.
    fn id_string(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Bot commands understood by the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Check,
    Monitor,
    Stop,
    Status,
}

impl Command {
    /// Parse the first word of a message, accepting the `/cmd@botname` form.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?.strip_prefix('/')?;
        let name = word.split('@').next().unwrap_or(word);
        match name {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "check" => Some(Self::Check),
            "monitor" => Some(Self::Monitor),
            "stop" => Some(Self::Stop),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

/// Handle one update from Telegram.
pub async fn webhook(
    State(state): State<ApiState>,
    Json(update): Json<Update>,
) -> Result<Json<Value>, ApiError> {
    let Some(message) = update.message else {
        return Ok(acknowledged());
    };
    let Some(text) = message.text.as_deref() else {
        return Ok(acknowledged());
    };

    if message.chat.id_string() != state.chat_id {
        log::warn!("Webhook message from unknown chat {}", message.chat.id_string());
        return Err(ApiError::Forbidden);
    }

    match Command::parse(text) {
        Some(command) => respond(&state.monitor, command).await,
        None => log::debug!("Ignoring webhook text: {text}"),
    }
    Ok(acknowledged())
}

fn acknowledged() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn respond(monitor: &Arc<Monitor>, command: Command) {
    let config = monitor.config();
    let text = match command {
        Command::Start => welcome_text(config),
        Command::Help => help_text(config),
        Command::Check => {
            reply(monitor, "🔍 Checking for new offers...").await;
            // Answer the webhook before the cycle finishes.
            let monitor = Arc::clone(monitor);
            tokio::spawn(async move {
                let text = match monitor.check_now().await {
                    Ok(report) => format!(
                        "✅ Check finished\nNew offers: {}\nTracked offers: {}",
                        report.new_offers.len(),
                        report.tracked
                    ),
                    Err(e) => {
                        log::error!("Manual check failed: {e}");
                        "❌ Check failed, see the service log".to_string()
                    }
                };
                reply(&monitor, &text).await;
            });
            return;
        }
        Command::Monitor => match monitor.start().await {
            StartOutcome::Started => started_text(config),
            StartOutcome::AlreadyRunning => "⚠️ Monitoring is already running.".to_string(),
        },
        Command::Stop => {
            monitor.stop().await;
            STOPPED_TEXT.to_string()
        }
        Command::Status => {
            let status = monitor.status(0).await;
            format!(
                "📊 <b>Monitoring status</b>\n\n\
                 • Monitoring: {}\n\
                 • Tracked offers: {}\n\
                 • Time: {}",
                if status.active { "🟢 ACTIVE" } else { "🔴 STOPPED" },
                status.item_count,
                Local::now().format("%H:%M:%S")
            )
        }
    };
    reply(monitor, &text).await;
}

pub(super) const STOPPED_TEXT: &str = "⏸️ Monitoring stopped.";

pub(super) fn started_text(config: &Config) -> String {
    format!(
        "✅ Monitoring started!\nChecking every {} seconds.",
        config.monitor.interval_secs
    )
}

/// Send a chat message to the configured destination.
pub(super) async fn reply(monitor: &Monitor, text: &str) {
    if !monitor.notifier().send(text, ParseMode::Html).await {
        log::warn!("Chat reply was not delivered");
    }
}

fn welcome_text(config: &Config) -> String {
    format!(
        "🚀 <b>Offer Hunter</b>\n\n\
         I watch the configured marketplace pages for new offers.\n\n\
         ✅ <b>Online sellers only</b>\n\
         ✅ <b>Price filter ({}-{} {})</b>\n\
         ✅ <b>Instant notifications</b>\n\n\
         📋 <b>Commands:</b>\n\
         /start - this message\n\
         /check - check now\n\
         /monitor - start monitoring\n\
         /stop - stop monitoring\n\
         /status - system status\n\
         /help - help",
        config.extraction.min_price,
        config.extraction.max_price,
        config.monitor.currency
    )
}

fn help_text(config: &Config) -> String {
    format!(
        "❓ <b>Help</b>\n\n\
         1. Send /monitor to start automatic monitoring\n\
         2. Pages are checked every {} seconds\n\
         3. Every new offer is sent here once\n\
         4. Only online sellers are reported\n\
         5. Price from {} to {} {}",
        config.monitor.interval_secs,
        config.extraction.min_price,
        config.extraction.max_price,
        config.monitor.currency
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("  /check now"), Some(Command::Check));
        assert_eq!(Command::parse("/monitor@hunter_bot"), Some(Command::Monitor));
        assert_eq!(Command::parse("/status"), Some(Command::Status));
        assert_eq!(Command::parse("stop"), None);
        assert_eq!(Command::parse("/unknown"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_chat_id_forms() {
        let numeric = Chat { id: json!(12345) };
        let text = Chat { id: json!("12345") };
        assert_eq!(numeric.id_string(), "12345");
        assert_eq!(text.id_string(), "12345");
    }

    #[test]
    fn test_help_mentions_price_range() {
        let help = help_text(&Config::default());
        assert!(help.contains("10"));
        assert!(help.contains("50000"));
        assert!(welcome_text(&Config::default()).contains("/monitor"));
    }
}
