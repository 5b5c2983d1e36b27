// src/models/mod.rs

//! Domain models for the hunter application.

mod config;
mod offer;

// Re-export all public types
pub use config::{
    Config, ExtractionConfig, FetchConfig, LoggingConfig, MonitorConfig, Secrets, ServerConfig,
    SourceTarget, TelegramConfig,
};
pub use offer::{Offer, escape_html};
