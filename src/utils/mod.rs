//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extract the item identifier from a detail-page URL.
///
/// Matches the portal's `/item/<ID>` path segment, where the ID is
/// uppercase alphanumeric.
pub fn extract_item_id(url: &str) -> Option<String> {
    let pattern = regex::Regex::new(r"/item/([A-Z0-9]+)").ok()?;
    pattern
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/path/").unwrap();
        assert_eq!(
            resolve_url(&base, "page.html"),
            "https://example.com/path/page.html"
        );
        assert_eq!(
            resolve_url(&base, "/item/ABC123"),
            "https://example.com/item/ABC123"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_extract_item_id() {
        assert_eq!(
            extract_item_id("https://www.archivportal-d.de/item/ABC123XYZ"),
            Some("ABC123XYZ".to_string())
        );
        assert_eq!(
            extract_item_id("/item/JNSQTCAV6PXZJYFVKL6BEU3GA4DFQLKV?lang=en"),
            Some("JNSQTCAV6PXZJYFVKL6BEU3GA4DFQLKV".to_string())
        );
        assert_eq!(extract_item_id("https://example.com/objekte?offset=0"), None);
        // Lowercase ids do not match the portal's pattern
        assert_eq!(extract_item_id("https://example.com/item/abc123"), None);
    }
}
