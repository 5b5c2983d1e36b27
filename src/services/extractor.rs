// src/services/extractor.rs

//! Offer extraction service.
//!
//! Turns one listing page into the offers worth reporting. Each card goes
//! through four gates in order: seller availability, keyword, price, link.
//! A card failing any gate is dropped on its own; the rest of the page is
//! still processed.

use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ExtractionConfig, Offer};
use crate::utils::resolve_link;

/// Why a card was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardRejection {
    MissingStatus,
    SellerOffline,
    MissingTitle,
    NoKeyword,
    MissingPrice,
    NoDigits,
    PriceOutOfRange(u64),
}

/// Offers plus counters for one page.
#[derive(Debug, Default, Clone)]
pub struct Extraction {
    pub offers: Vec<Offer>,
    pub cards_found: usize,
    pub cards_scanned: usize,
    pub online: usize,
    pub offline: usize,
}

/// Heuristic HTML-to-offer parser.
#[derive(Debug, Clone)]
pub struct OfferExtractor {
    card_sel: Selector,
    status_sel: Selector,
    title_sel: Selector,
    price_sel: Selector,
    anchor_sel: Selector,
    origin: Url,
    online_markers: Vec<String>,
    keywords: Vec<String>,
    min_price: u64,
    max_price: u64,
    scan_limit: usize,
    title_max_chars: usize,
}

impl OfferExtractor {
    /// Compile the configured rules.
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            card_sel: Self::parse_selector(&config.card_selector)?,
            status_sel: Self::parse_selector(&config.status_selector)?,
            title_sel: Self::parse_selector(&config.title_selector)?,
            price_sel: Self::parse_selector(&config.price_selector)?,
            anchor_sel: Self::parse_selector("a")?,
            origin: Url::parse(&config.origin)?,
            online_markers: config
                .online_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            keywords: config.keywords.iter().map(|k| k.to_lowercase()).collect(),
            min_price: config.min_price,
            max_price: config.max_price,
            scan_limit: config.scan_limit,
            title_max_chars: config.title_max_chars,
        })
    }

    /// Extract offers from a page in document order.
    pub fn extract(&self, html: &str, category: &str, page_url: &str) -> Vec<Offer> {
        self.extract_page(html, category, page_url).offers
    }

    /// Extract offers and keep the per-page counters.
    pub fn extract_page(&self, html: &str, category: &str, page_url: &str) -> Extraction {
        let document = Html::parse_document(html);
        let mut extraction = Extraction {
            cards_found: document.select(&self.card_sel).count(),
            ..Extraction::default()
        };

        for card in document.select(&self.card_sel).take(self.scan_limit) {
            extraction.cards_scanned += 1;
            match self.parse_card(&card, category, page_url) {
                Ok(offer) => {
                    extraction.online += 1;
                    log::debug!("Accepted '{}' - {}", offer.title, offer.price);
                    extraction.offers.push(offer);
                }
                Err(CardRejection::MissingStatus) => {
                    log::debug!("Skipping card without seller status");
                }
                Err(CardRejection::SellerOffline) => extraction.offline += 1,
                Err(reason) => {
                    extraction.online += 1;
                    log::debug!("Skipping card: {reason:?}");
                }
            }
        }

        log::info!(
            "{}: {} cards ({} scanned), {} online, {} offline, {} offers",
            category,
            extraction.cards_found,
            extraction.cards_scanned,
            extraction.online,
            extraction.offline,
            extraction.offers.len()
        );
        extraction
    }

    fn parse_card(
        &self,
        card: &ElementRef,
        category: &str,
        page_url: &str,
    ) -> std::result::Result<Offer, CardRejection> {
        let status_elem = card
            .select(&self.status_sel)
            .next()
            .ok_or(CardRejection::MissingStatus)?;
        let status = collect_text(&status_elem).to_lowercase();
        if !self.online_markers.iter().any(|m| status.contains(m)) {
            return Err(CardRejection::SellerOffline);
        }

        let title_elem = card
            .select(&self.title_sel)
            .next()
            .ok_or(CardRejection::MissingTitle)?;
        let title = collect_text(&title_elem);
        let title_lower = title.to_lowercase();
        if !self.keywords.iter().any(|k| title_lower.contains(k)) {
            return Err(CardRejection::NoKeyword);
        }

        let price_elem = card
            .select(&self.price_sel)
            .next()
            .ok_or(CardRejection::MissingPrice)?;
        let price = parse_price(&collect_text(&price_elem)).ok_or(CardRejection::NoDigits)?;
        if price < self.min_price || price > self.max_price {
            return Err(CardRejection::PriceOutOfRange(price));
        }

        // The card itself is usually the anchor.
        let anchor = if card.value().name() == "a" {
            Some(*card)
        } else {
            card.select(&self.anchor_sel).next()
        };
        let link = anchor
            .and_then(|a| a.value().attr("href"))
            .map(|href| resolve_link(&self.origin, href, page_url))
            .unwrap_or_else(|| page_url.to_string());

        Ok(Offer {
            identity: offer_identity(&title, price, &link),
            title: truncate_graphemes(&title, self.title_max_chars),
            price,
            link,
            category: category.to_string(),
            seller_online: true,
        })
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// Concatenate every digit in `text` into one number.
///
/// Separators of any kind disappear, so "1 234 руб." reads as 1234. Text with
/// no digits, or more digits than fit in a `u64`, yields `None`.
pub fn parse_price(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Hex SHA-256 over title, price and link.
pub fn offer_identity(title: &str, price: u64, link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(price.to_string().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(link.as_bytes());
    hex::encode(hasher.finalize())
}

fn truncate_graphemes(text: &str, max: usize) -> String {
    text.graphemes(true).take(max).collect()
}

fn collect_text(elem: &ElementRef) -> String {
    elem.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
