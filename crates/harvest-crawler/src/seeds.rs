//! Cleanup of user-supplied seed URLs.

use url::Url;

/// Turn raw user input into crawlable seed URLs.
///
/// Entries are trimmed and blanks dropped; a missing scheme becomes
/// `https://`. Anything that still is not an http(s) URL with a host is
/// discarded.
#[must_use]
pub fn validate_urls<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|entry| {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                return None;
            }

            let candidate = if has_http_scheme(entry) {
                entry.to_string()
            } else {
                format!("https://{entry}")
            };

            match Url::parse(&candidate) {
                Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {
                    Some(candidate)
                }
                _ => {
                    tracing::debug!("Dropping invalid seed URL: {}", entry);
                    None
                }
            }
        })
        .collect()
}

fn has_http_scheme(entry: &str) -> bool {
    let lower = entry.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_scheme_and_trims() {
        let urls = validate_urls(["  acme.com ", "http://b.com/about", "", "   "]);
        assert_eq!(urls, vec!["https://acme.com", "http://b.com/about"]);
    }

    #[test]
    fn test_drops_unparsable() {
        let urls = validate_urls(["https://", "exa mple.com", "https://ok.com"]);
        assert_eq!(urls, vec!["https://ok.com"]);
    }

    #[test]
    fn test_keeps_order_and_duplicates() {
        let urls = validate_urls(vec!["b.com".to_string(), "a.com".to_string(), "b.com".to_string()]);
        assert_eq!(urls, vec!["https://b.com", "https://a.com", "https://b.com"]);
    }

    #[test]
    fn test_scheme_case_insensitive() {
        let urls = validate_urls(["HTTPS://Acme.com"]);
        assert_eq!(urls, vec!["HTTPS://Acme.com"]);
    }
}
