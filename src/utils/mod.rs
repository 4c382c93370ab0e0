//! Utility functions and helpers.

pub mod date;
pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Collapse every whitespace run to a single space.
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com:2053/Calendar/").unwrap();
        assert_eq!(
            resolve_url(&base, "/LeagueTable/Results/7"),
            "https://example.com:2053/LeagueTable/Results/7"
        );
        assert_eq!(
            resolve_url(&base, "meet.html"),
            "https://example.com:2053/Calendar/meet.html"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_squash_whitespace() {
        assert_eq!(squash_whitespace("  120 \n\t "), "120");
        assert_eq!(squash_whitespace("a  b\nc"), "a b c");
    }
}
