//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a card link the way the marketplace writes them.
///
/// Hrefs starting with `/` are appended to `origin`, so even `//host/x` stays
/// on the origin. Absolute `http(s)` links are kept, and anything else (empty,
/// `javascript:`, fragment-only, relative without a leading slash) falls back
/// to `page_url`.
pub fn resolve_link(origin: &Url, href: &str, page_url: &str) -> String {
    let href = href.trim();
    if href.starts_with('/') {
        let base = origin.as_str().trim_end_matches('/');
        return Url::parse(&format!("{base}{href}"))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| page_url.to_string());
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    page_url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://example.test").unwrap()
    }

    #[test]
    fn test_resolve_site_relative() {
        assert_eq!(
            resolve_link(&origin(), "/lots/123", "https://example.test/chips/1/"),
            "https://example.test/lots/123"
        );
    }

    #[test]
    fn test_resolve_protocol_relative_stays_on_origin() {
        let resolved = resolve_link(&origin(), "//other.host/x", "https://example.test/");
        assert_eq!(resolved, "https://example.test//other.host/x");
        assert_eq!(Url::parse(&resolved).unwrap().host_str(), Some("example.test"));
    }

    #[test]
    fn test_resolve_absolute_kept() {
        assert_eq!(
            resolve_link(&origin(), "https://other.test/x", "https://example.test/"),
            "https://other.test/x"
        );
    }

    #[test]
    fn test_resolve_other_shapes_fall_back_to_page() {
        let page = "https://example.test/chips/1/";
        assert_eq!(resolve_link(&origin(), "", page), page);
        assert_eq!(resolve_link(&origin(), "#top", page), page);
        assert_eq!(resolve_link(&origin(), "lots/5", page), page);
    }
}
