//! Offer data structure.

use serde::{Deserialize, Serialize};

/// A listing that passed every extraction gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Offer {
    /// Stable identity across polling cycles
    pub identity: String,

    /// Card title, truncated for display
    pub title: String,

    /// Price as a whole number
    pub price: u64,

    /// Absolute URL of the listing
    pub link: String,

    /// Category label supplied by the caller
    pub category: String,

    /// Whether the seller was online when the page was fetched
    pub seller_online: bool,
}

impl Offer {
    /// Render the Telegram HTML message announcing this offer.
    pub fn notification(&self, currency: &str, time: &str) -> String {
        format!(
            "🎮 <b>NEW OFFER {category}</b>\n\n\
             📦 <b>{title}</b>\n\
             💰 <b>Price:</b> {price} {currency}\n\
             🟢 <b>Status:</b> seller online\n\
             🔗 <a href=\"{link}\">Open listing</a>\n\n\
             ⏰ {time}",
            category = escape_html(&self.category),
            title = escape_html(&self.title),
            price = self.price,
            currency = escape_html(currency),
            link = escape_html(&self.link),
            time = time,
        )
    }

    /// Short single-line form used in logs and CLI output.
    pub fn summary_line(&self, currency: &str) -> String {
        format!("{} - {} {} ({})", self.title, self.price, currency, self.link)
    }
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_offer() -> Offer {
        Offer {
            identity: "abc".to_string(),
            title: "Black Russia <1kk> & more".to_string(),
            price: 500,
            link: "https://example.test/lots/1?a=1&b=2".to_string(),
            category: "Black Russia".to_string(),
            seller_online: true,
        }
    }

    #[test]
    fn test_notification_escapes_markup() {
        let text = sample_offer().notification("руб.", "12:30:00");
        assert!(text.contains("Black Russia &lt;1kk&gt; &amp; more"));
        assert!(text.contains("500 руб."));
        assert!(text.contains("href=\"https://example.test/lots/1?a=1&amp;b=2\""));
        assert!(text.ends_with("12:30:00"));
    }

    #[test]
    fn test_summary_line() {
        let line = sample_offer().summary_line("RUB");
        assert_eq!(
            line,
            "Black Russia <1kk> & more - 500 RUB (https://example.test/lots/1?a=1&b=2)"
        );
    }

    #[test]
    fn test_escape_html_plain_text_unchanged() {
        assert_eq!(escape_html("Вирты 1kk"), "Вирты 1kk");
    }
}
