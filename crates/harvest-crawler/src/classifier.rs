//! URL classification: dedup keys and traversal scope.

use url::Url;

/// Path keywords that mark a page as likely to carry contact details.
pub const CONTACT_KEYWORDS: [&str; 5] = ["contact", "about", "team", "support", "connect"];

/// Dedup key for a URL: lower-cased, one trailing slash removed.
#[must_use]
pub fn normalize(url: &str) -> String {
    let lower = url.to_lowercase();
    match lower.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}

/// Whether `candidate` should be traversed from a crawl rooted at `seed`.
///
/// The candidate must share the seed's scheme, host and port and its path
/// must contain a contact keyword. Unparsable URLs are out of scope.
#[must_use]
pub fn in_scope(candidate: &str, seed: &str) -> bool {
    let (Ok(candidate), Ok(seed)) = (Url::parse(candidate), Url::parse(seed)) else {
        return false;
    };

    if !same_origin(&candidate, &seed) {
        return false;
    }

    let path = candidate.path().to_lowercase();
    CONTACT_KEYWORDS.iter().any(|keyword| path.contains(keyword))
}

/// Resolve an anchor `href` against the page it was found on.
///
/// Fragments are dropped since they address the same document.
#[must_use]
pub fn resolve(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut resolved = Url::parse(base).ok()?.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved.into())
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str().is_some()
        && a.host_str().map(str::to_ascii_lowercase) == b.host_str().map(str::to_ascii_lowercase)
        && a.port_or_known_default() == b.port_or_known_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_case_and_trailing_slash() {
        assert_eq!(normalize("https://Acme.com/Contact/"), "https://acme.com/contact");
        assert_eq!(
            normalize("https://acme.com/contact"),
            normalize("HTTPS://ACME.COM/CONTACT/")
        );
        assert_eq!(normalize("https://acme.com//"), "https://acme.com/");
    }

    #[test]
    fn test_in_scope_requires_keyword() {
        let seed = "https://acme.com";
        assert!(in_scope("https://acme.com/contact", seed));
        assert!(in_scope("https://acme.com/company/About-Us", seed));
        assert!(in_scope("https://acme.com/our-team", seed));
        assert!(in_scope("https://acme.com/help/support", seed));
        assert!(in_scope("https://acme.com/connect", seed));
        assert!(!in_scope("https://acme.com/products", seed));
        assert!(!in_scope("https://acme.com/", seed));
    }

    #[test]
    fn test_in_scope_rejects_other_hosts() {
        let seed = "https://acme.com";
        assert!(!in_scope("https://other.com/contact", seed));
        assert!(!in_scope("https://blog.acme.com/contact", seed));
        assert!(!in_scope("http://acme.com/contact", seed));
        assert!(!in_scope("https://acme.com:8443/contact", seed));
        assert!(in_scope("https://ACME.com:443/contact", seed));
    }

    #[test]
    fn test_in_scope_keyword_only_in_path() {
        assert!(!in_scope("https://acme.com/?page=contact", "https://acme.com"));
        assert!(!in_scope("https://contact.example/", "https://contact.example/"));
    }

    #[test]
    fn test_in_scope_fails_closed() {
        assert!(!in_scope("not a url", "https://acme.com"));
        assert!(!in_scope("https://acme.com/contact", "::"));
        assert!(!in_scope("mailto:hi@acme.com", "https://acme.com"));
    }

    #[test]
    fn test_resolve_relative_links() {
        let base = "https://acme.com/about/";
        assert_eq!(
            resolve(base, "team").as_deref(),
            Some("https://acme.com/about/team")
        );
        assert_eq!(
            resolve(base, "/contact#form").as_deref(),
            Some("https://acme.com/contact")
        );
        assert_eq!(
            resolve(base, "https://other.com/x").as_deref(),
            Some("https://other.com/x")
        );
        assert_eq!(resolve(base, "#top"), None);
        assert_eq!(resolve(base, "  "), None);
        assert_eq!(resolve("not a url", "/contact"), None);
    }
}
