//! Service layer for the hunter application.
//!
//! This module contains the building blocks the monitor wires together:
//! - Page fetching (`PageFetcher`, `HttpFetcher`)
//! - Offer extraction (`OfferExtractor`)
//! - Deduplication (`SeenOffers`)
//! - Notification delivery (`Notifier`, `TelegramNotifier`)

mod extractor;
mod fetcher;
mod notifier;
mod store;

pub use extractor::{CardRejection, Extraction, OfferExtractor, offer_identity, parse_price};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use notifier::{LogNotifier, Notifier, ParseMode, TelegramNotifier};
pub use store::SeenOffers;
