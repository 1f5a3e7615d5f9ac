//! User input validation performed before any request is made.

use regex::Regex;
use std::sync::LazyLock;

static FIGMA_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^https://www\.figma\.com/(file|design)/[a-zA-Z0-9]+").ok());

pub const EMPTY_URL_MESSAGE: &str = "Please enter a Figma URL";

pub const INVALID_URL_MESSAGE: &str = "Invalid Figma URL format. URL should be like: https://www.figma.com/file/... or https://www.figma.com/design/...";

/// Check that `url` looks like a Figma file or design URL.
///
/// Returns the message to show the user when it does not.
pub fn validate_design_url(url: &str) -> Result<(), String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(EMPTY_URL_MESSAGE.to_string());
    }

    match FIGMA_URL.as_ref() {
        Some(pattern) if pattern.is_match(url) => Ok(()),
        _ => Err(INVALID_URL_MESSAGE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_file_and_design_urls() {
        assert!(validate_design_url("https://www.figma.com/file/AbC123/Checkout").is_ok());
        assert!(validate_design_url("https://www.figma.com/design/xYz9?node-id=1-2").is_ok());
        assert!(validate_design_url("  https://www.figma.com/file/abc  ").is_ok());
    }

    #[test]
    fn test_rejects_empty_url() {
        assert_eq!(validate_design_url("   "), Err(EMPTY_URL_MESSAGE.to_string()));
    }

    #[test]
    fn test_rejects_other_hosts_and_paths() {
        for url in [
            "http://www.figma.com/file/abc",
            "https://figma.com/file/abc",
            "https://www.figma.com/proto/abc",
            "https://www.figma.com/file/",
            "not a url",
        ] {
            assert_eq!(
                validate_design_url(url),
                Err(INVALID_URL_MESSAGE.to_string()),
                "{url} should be rejected"
            );
        }
    }
}
